// Resume analysis prompt templates.
// All prompts for the analysis module are defined here.

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert technical recruiter for skilled trades, engineering, and software roles. \
You screen candidate resumes and produce a structured report. \
Extract the candidate's contact details exactly as written; never invent them. \
Score honestly: risk 1 = low risk, 10 = high risk; reward 1 = low upside, 10 = high upside; \
overall fit 1 = poor fit, 10 = excellent fit.";

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{job_section}

CANDIDATE RESUME:
{resume_text}

OUTPUT SCHEMA (return exactly this structure, every key present):
{
  "first_name": "string" | null,
  "last_name": "string" | null,
  "email": "string" | null,
  "phone": "string" | null,
  "candidate_strengths": ["string"],
  "candidate_weaknesses": ["string"],
  "risk_factor": {"score": 1-10, "explanation": "string"},
  "reward_factor": {"score": 1-10, "explanation": "string"},
  "overall_fit_rating": 1-10,
  "justification_for_rating": "string",
  "skills": [{"name": "string", "proficiency": "expert" | "proficient" | "familiar" | null, "years": number | null}]
}

RULES:
1. Strengths and weaknesses must cite specific qualifications or gaps from the resume.
2. List at most 10 skills, most relevant first. Use years only when the resume states them.
3. Return ONLY the JSON object."#;

pub const JOB_SECTION_TEMPLATE: &str = "\
Analyze how well the candidate matches the core requirements and ideal profile of this role.

JOB DESCRIPTION:
{job_description}";

pub const GENERAL_SCREENING_SECTION: &str = "\
No job description was provided. Give a general screening: judge the candidate against \
the roles their own experience points to.";

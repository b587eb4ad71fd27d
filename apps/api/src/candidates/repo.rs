use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::analysis::{
    CandidateSkillRow, CandidateStatus, CandidateTagRow, NewResumeAnalysis, NewSkill,
    ResumeAnalysisRow,
};

pub const DEFAULT_TAG_COLOR: &str = "#007bff";

/// A candidate record with its skills and tags.
#[derive(Debug, Serialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub analysis: ResumeAnalysisRow,
    pub name: String,
    pub skills: Vec<CandidateSkillRow>,
    pub tags: Vec<CandidateTagRow>,
}

/// Inserts an analysis and its skills in one transaction.
pub async fn insert_analysis(
    pool: &PgPool,
    new: &NewResumeAnalysis,
) -> Result<ResumeAnalysisRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let row = insert_analysis_in(&mut *tx, new).await?;
    tx.commit().await?;
    Ok(row)
}

/// Inserts an analysis and its skills on a connection the caller holds a transaction on.
pub async fn insert_analysis_in(
    conn: &mut PgConnection,
    new: &NewResumeAnalysis,
) -> Result<ResumeAnalysisRow, sqlx::Error> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ResumeAnalysisRow>(
        r#"
        INSERT INTO resume_analyses
            (id, filename, first_name, last_name, email, phone, location,
             resume_text, job_description, candidate_strengths, candidate_weaknesses,
             risk_factor_score, risk_factor_explanation, reward_factor_score,
             reward_factor_explanation, overall_fit_rating, justification,
             relevant_jobs, status, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&new.filename)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.location)
    .bind(&new.resume_text)
    .bind(&new.job_description)
    .bind(&new.candidate_strengths)
    .bind(&new.candidate_weaknesses)
    .bind(new.risk_factor_score)
    .bind(&new.risk_factor_explanation)
    .bind(new.reward_factor_score)
    .bind(&new.reward_factor_explanation)
    .bind(new.overall_fit_rating)
    .bind(&new.justification)
    .bind(&new.relevant_jobs)
    .bind(new.status.as_str())
    .bind(new.source.as_str())
    .fetch_one(&mut *conn)
    .await?;

    for skill in &new.skills {
        sqlx::query(
            r#"
            INSERT INTO candidate_skills (id, candidate_id, skill_name, skill_level, years_experience)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (candidate_id, skill_name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&skill.name)
        .bind(&skill.level)
        .bind(skill.years)
        .execute(&mut *conn)
        .await?;
    }

    info!(
        "Stored analysis {id} ({}) with {} skills",
        new.filename,
        new.skills.len()
    );
    Ok(row)
}

pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<Option<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>("SELECT * FROM resume_analyses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_skills(pool: &PgPool, id: Uuid) -> Result<Vec<CandidateSkillRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateSkillRow>(
        "SELECT * FROM candidate_skills WHERE candidate_id = $1 ORDER BY created_at, skill_name",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

pub async fn list_tags(pool: &PgPool, id: Uuid) -> Result<Vec<CandidateTagRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateTagRow>(
        "SELECT * FROM candidate_tags WHERE candidate_id = $1 ORDER BY tag_name",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

pub async fn get_candidate_detail(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CandidateDetail>, sqlx::Error> {
    let Some(analysis) = get_analysis(pool, id).await? else {
        return Ok(None);
    };
    let skills = list_skills(pool, id).await?;
    let tags = list_tags(pool, id).await?;
    Ok(Some(CandidateDetail {
        name: analysis.display_name(),
        analysis,
        skills,
        tags,
    }))
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>(
        "SELECT * FROM resume_analyses ORDER BY upload_date DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_history(pool: &PgPool) -> Result<Vec<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>("SELECT * FROM resume_analyses ORDER BY upload_date DESC")
        .fetch_all(pool)
        .await
}

/// All rows except `id`, for similarity ranking.
pub async fn list_others(pool: &PgPool, id: Uuid) -> Result<Vec<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>("SELECT * FROM resume_analyses WHERE id <> $1")
        .bind(id)
        .fetch_all(pool)
        .await
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: CandidateStatus,
) -> Result<Option<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>(
        "UPDATE resume_analyses SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}

/// Deletes a record. Skills and tags go with it through the foreign-key cascade.
pub async fn delete_analysis(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resume_analyses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Adds a skill, or updates level and years when the name already exists.
pub async fn add_skill(
    pool: &PgPool,
    candidate_id: Uuid,
    skill: &NewSkill,
) -> Result<CandidateSkillRow, sqlx::Error> {
    sqlx::query_as::<_, CandidateSkillRow>(
        r#"
        INSERT INTO candidate_skills (id, candidate_id, skill_name, skill_level, years_experience)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (candidate_id, skill_name) DO UPDATE
            SET skill_level = COALESCE(EXCLUDED.skill_level, candidate_skills.skill_level),
                years_experience = COALESCE(EXCLUDED.years_experience, candidate_skills.years_experience)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(candidate_id)
    .bind(&skill.name)
    .bind(&skill.level)
    .bind(skill.years)
    .fetch_one(pool)
    .await
}

/// Adds a tag; an existing tag with the same name takes the new color.
pub async fn add_tag(
    pool: &PgPool,
    candidate_id: Uuid,
    tag_name: &str,
    tag_color: &str,
) -> Result<CandidateTagRow, sqlx::Error> {
    sqlx::query_as::<_, CandidateTagRow>(
        r#"
        INSERT INTO candidate_tags (id, candidate_id, tag_name, tag_color)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (candidate_id, tag_name) DO UPDATE SET tag_color = EXCLUDED.tag_color
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(candidate_id)
    .bind(tag_name)
    .bind(tag_color)
    .fetch_one(pool)
    .await
}

pub async fn remove_tag(pool: &PgPool, candidate_id: Uuid, tag_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM candidate_tags WHERE id = $1 AND candidate_id = $2")
        .bind(tag_id)
        .bind(candidate_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_email<'e>(
    executor: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<ResumeAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalysisRow>(
        "SELECT * FROM resume_analyses WHERE LOWER(email) = LOWER($1) ORDER BY upload_date LIMIT 1",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

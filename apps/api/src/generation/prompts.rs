// Prompt constants for the three generation kinds.
// Placeholders: {resume_text}, {job_description}, {grounding_instruction},
// {plain_text_instruction}. Templates are filled by builder::fill_template.

/// System role for cover letters.
pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach and professional \
    writer who specializes in cover letters that help candidates stand out.";

pub const COVER_LETTER_TEMPLATE: &str = r#"Using the resume and job description below, write a professional, compelling cover letter that:

1. Highlights the experience and skills from the resume that match the job requirements
2. Shows enthusiasm for this specific role and company
3. Demonstrates a clear understanding of what the job requires
4. Is personalized and specific: cite concrete details from BOTH the resume and the job description, never generic filler
5. Is professional yet engaging in tone
6. Is 3-4 paragraphs long

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

Open the letter with "Dear Hiring Manager," and close it with "Sincerely," followed by the placeholder [Your Name].

{grounding_instruction}

{plain_text_instruction}"#;

/// System role for bullet enhancement.
pub const BULLET_ENHANCEMENT_SYSTEM: &str = "You are an expert resume writer and career \
    coach who tailors resumes to specific job openings.";

pub const BULLET_ENHANCEMENT_TEMPLATE: &str = r#"Using the resume and target job description below, suggest improved resume bullet points.

CURRENT RESUME:
{resume_text}

TARGET JOB DESCRIPTION:
{job_description}

Provide 5-8 enhanced bullet points that would strengthen this resume for the target role.

RULES:
1. Start every bullet point with a strong action verb
2. Frame each bullet with the STAR method (Situation, Task, Action, Result) where applicable, and quantify the result when the resume supports it
3. Reuse specific keywords from the job description wherever they truthfully apply
4. Focus on the experience most relevant to the target role
5. Keep each bullet concise yet impactful

Format the response as a bulleted list. Under each bullet, add a one-sentence rationale explaining why the enhancement is effective for this role.

{grounding_instruction}"#;

/// System role for match analysis.
pub const MATCH_ANALYSIS_SYSTEM: &str = "You are an expert applicant tracking system (ATS) \
    analyst and career coach who measures how well a resume fits a job opening.";

pub const MATCH_ANALYSIS_TEMPLATE: &str = r#"Analyze how well this resume matches the job description.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

Provide, each under its own heading:
1. Match score: a single number from 0-100
2. Top 5 strengths that align with the job
3. Top 3 gaps or areas for improvement
4. Keywords from the job description that should be added to the resume, as a list
5. One overall recommendation

{grounding_instruction}"#;

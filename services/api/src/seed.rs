//! services/api/src/seed.rs
//!
//! Preseed data and the idempotent seeding step. Each collection is filled only
//! when it is empty; existing data is never cleared.

use serde::Serialize;
use serde_json::{json, Value};
use talentflow_core::ports::{Collection, DocumentStore, PortResult};
use tracing::{debug, info};
use utoipa::ToSchema;

/// How many documents the seeding step inserted per collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub jobs: usize,
    pub candidates: usize,
    pub assessments: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.jobs == 0 && self.candidates == 0 && self.assessments == 0
    }
}

/// Fills every empty seeded collection.
pub async fn ensure_seeded(store: &dyn DocumentStore) -> PortResult<SeedReport> {
    let report = SeedReport {
        jobs: seed_collection(store, Collection::Jobs, preseed_jobs).await?,
        candidates: seed_collection(store, Collection::Candidates, preseed_candidates).await?,
        assessments: seed_collection(store, Collection::Assessments, preseed_assessments).await?,
    };
    if report.is_empty() {
        info!("Document store already has data, skipping seeding");
    } else {
        info!(?report, "Preseed data added");
    }
    Ok(report)
}

async fn seed_collection(
    store: &dyn DocumentStore,
    collection: Collection,
    documents: fn() -> Vec<Value>,
) -> PortResult<usize> {
    let existing = store.count(collection).await?;
    if existing > 0 {
        debug!(%collection, existing, "Collection already seeded");
        return Ok(0);
    }
    let documents: Vec<(String, Value)> = documents()
        .into_iter()
        .map(|doc| (doc["id"].as_str().unwrap_or_default().to_string(), doc))
        .collect();
    let inserted = documents.len();
    store.bulk_add(collection, documents).await?;
    Ok(inserted)
}

//=========================================================================================
// Preseed Data
//=========================================================================================

fn preseed_jobs() -> Vec<Value> {
    vec![
        json!({
            "id": "job-1",
            "title": "Senior Frontend Developer",
            "slug": "senior-frontend-developer",
            "description": "We're looking for an experienced frontend developer to join our growing team and help build the next generation of web applications.",
            "status": "active",
            "tags": ["React", "TypeScript", "Frontend", "Senior"],
            "order": 1,
            "createdAt": "2024-01-15T00:00:00Z",
            "updatedAt": "2024-01-15T00:00:00Z",
        }),
        json!({
            "id": "job-2",
            "title": "Full Stack Engineer",
            "slug": "full-stack-engineer",
            "description": "Join our engineering team to build scalable web applications from frontend to backend.",
            "status": "active",
            "tags": ["Full Stack", "Node.js", "React", "Cloud"],
            "order": 2,
            "createdAt": "2024-01-20T00:00:00Z",
            "updatedAt": "2024-01-20T00:00:00Z",
        }),
        json!({
            "id": "job-3",
            "title": "UX/UI Designer",
            "slug": "ux-ui-designer",
            "description": "Shape the user experience of our products through research, prototyping and visual design.",
            "status": "active",
            "tags": ["Design", "Figma", "UX"],
            "order": 3,
            "createdAt": "2024-01-25T00:00:00Z",
            "updatedAt": "2024-01-25T00:00:00Z",
        }),
        json!({
            "id": "job-4",
            "title": "DevOps Engineer",
            "slug": "devops-engineer",
            "description": "Own our deployment pipelines and cloud infrastructure.",
            "status": "archived",
            "tags": ["AWS", "Kubernetes", "CI/CD"],
            "order": 4,
            "createdAt": "2024-01-28T00:00:00Z",
            "updatedAt": "2024-01-28T00:00:00Z",
        }),
    ]
}

const FIRST_NAMES: [&str; 10] = [
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Ivy", "Jack",
];
const LAST_NAMES: [&str; 7] = [
    "Johnson", "Smith", "Davis", "Wilson", "Brown", "Miller", "Garcia",
];
const STAGES: [&str; 7] = [
    "applied", "screening", "interview", "assessment", "offer", "hired", "rejected",
];
const CANDIDATE_COUNT: usize = 30;

/// Deterministic candidates; every third one carries an assessment score.
fn preseed_candidates() -> Vec<Value> {
    (1..=CANDIDATE_COUNT)
        .map(|i| {
            let first = FIRST_NAMES[i % FIRST_NAMES.len()];
            let last = LAST_NAMES[i % LAST_NAMES.len()];
            let job = i % 3 + 1;
            let created_at = format!("2024-02-{:02}T09:00:00Z", i % 28 + 1);
            let scores = if i % 3 == 0 {
                json!([{
                    "assessmentId": format!("assessment-{}", job),
                    "score": 60 + (i * 7) % 40,
                    "maxScore": 100,
                    "completedAt": format!("2024-03-{:02}T15:00:00Z", i % 28 + 1),
                }])
            } else {
                json!([])
            };
            json!({
                "id": format!("candidate-{}", i),
                "name": format!("{} {}", first, last),
                "email": format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i),
                "jobId": format!("job-{}", job),
                "stage": STAGES[i % STAGES.len()],
                "assessmentScores": scores,
                "createdAt": created_at,
            })
        })
        .collect()
}

fn choice(id: &str, kind: &str, question: &str, options: &[&str], order: u32) -> Value {
    json!({
        "id": id,
        "type": kind,
        "question": question,
        "required": true,
        "options": options,
        "order": order,
    })
}

fn text(id: &str, kind: &str, question: &str, required: bool, min: usize, max: usize, order: u32) -> Value {
    json!({
        "id": id,
        "type": kind,
        "question": question,
        "required": required,
        "validation": { "minLength": min, "maxLength": max },
        "order": order,
    })
}

fn numeric(id: &str, question: &str, max: f64, order: u32) -> Value {
    json!({
        "id": id,
        "type": "numeric",
        "question": question,
        "required": true,
        "validation": { "min": 0, "max": max },
        "order": order,
    })
}

fn assessment(id: &str, job_id: &str, title: &str, description: &str, created: &str, sections: Vec<Value>) -> Value {
    json!({
        "id": id,
        "jobId": job_id,
        "title": title,
        "description": description,
        "sections": sections,
        "isPublished": true,
        "shareableLink": format!("share-{}", id),
        "createdAt": created,
        "updatedAt": created,
    })
}

fn preseed_assessments() -> Vec<Value> {
    let mut state_management = text(
        "q10",
        "long-text",
        "Describe your experience with state management libraries (Redux, Zustand, etc.)",
        false,
        50,
        1000,
        3,
    );
    state_management["conditionalLogic"] = json!({ "dependsOn": "q6", "showWhen": "Jest" });

    vec![
        assessment(
            "assessment-1",
            "job-1",
            "Frontend Developer Technical Assessment",
            "Comprehensive evaluation of frontend development skills including React, JavaScript, and modern web technologies.",
            "2024-01-30T00:00:00Z",
            vec![
                json!({
                    "id": "section-1",
                    "title": "React & JavaScript Fundamentals",
                    "description": "Core concepts and best practices",
                    "order": 0,
                    "questions": [
                        choice("q1", "single-choice", "What is the purpose of React hooks?", &[
                            "To add state and lifecycle methods to functional components",
                            "To create class components",
                            "To handle routing",
                            "To manage CSS styles",
                        ], 0),
                        choice("q2", "multi-choice", "Which of the following are valid React lifecycle methods?", &[
                            "componentDidMount", "componentWillUpdate", "useEffect", "componentDidUpdate",
                        ], 1),
                        text("q3", "short-text", "Explain the difference between props and state in React.", true, 50, 500, 2),
                        text("q5", "long-text", "Write a React component that fetches and displays a list of users from an API.", true, 100, 2000, 3),
                    ],
                }),
                json!({
                    "id": "section-2",
                    "title": "Advanced Frontend Concepts",
                    "description": "Performance, testing, and modern tooling",
                    "order": 1,
                    "questions": [
                        choice("q6", "multi-choice", "Which tools can be used for React testing?", &[
                            "Jest", "React Testing Library", "Enzyme", "Cypress",
                        ], 0),
                        text("q7", "short-text", "How would you optimize a React application's performance?", true, 100, 800, 1),
                        numeric("q9", "How many years of React experience do you have?", 20.0, 2),
                        state_management,
                    ],
                }),
            ],
        ),
        assessment(
            "assessment-2",
            "job-2",
            "Full Stack Developer Assessment",
            "Comprehensive assessment covering both frontend and backend development skills with focus on modern web technologies.",
            "2024-02-01T00:00:00Z",
            vec![
                json!({
                    "id": "section-3",
                    "title": "Backend Development",
                    "description": "Server-side development and API design",
                    "order": 0,
                    "questions": [
                        choice("q11", "single-choice", "Which HTTP method is typically used to update a resource?", &[
                            "GET", "POST", "PUT", "DELETE",
                        ], 0),
                        text("q12", "short-text", "Explain the difference between SQL and NoSQL databases.", true, 50, 300, 1),
                        text("q14", "long-text", "Design a RESTful API for a blog application with posts and comments.", true, 200, 1500, 2),
                    ],
                }),
                json!({
                    "id": "section-4",
                    "title": "Database & DevOps",
                    "description": "Database design and deployment practices",
                    "order": 1,
                    "questions": [
                        choice("q17", "multi-choice", "Which are popular cloud platforms?", &[
                            "AWS", "Google Cloud", "Azure", "DigitalOcean",
                        ], 0),
                        text("q19", "long-text", "Describe your experience with CI/CD pipelines and deployment strategies.", false, 100, 1000, 1),
                        numeric("q20", "How many years of full-stack development experience do you have?", 25.0, 2),
                    ],
                }),
            ],
        ),
        assessment(
            "assessment-3",
            "job-3",
            "UX/UI Designer Assessment",
            "Comprehensive evaluation of design skills, user experience principles, and design tool proficiency.",
            "2024-02-03T00:00:00Z",
            vec![
                json!({
                    "id": "section-5",
                    "title": "Design Principles & Theory",
                    "description": "Fundamental design concepts and user experience",
                    "order": 0,
                    "questions": [
                        choice("q21", "single-choice", "What is the primary goal of user-centered design?", &[
                            "To create designs that meet user needs and expectations",
                            "To make designs look aesthetically pleasing",
                            "To reduce development costs",
                            "To follow current design trends",
                        ], 0),
                        text("q23", "short-text", "Explain the difference between UX and UI design.", true, 100, 500, 1),
                    ],
                }),
                json!({
                    "id": "section-6",
                    "title": "Tools & Implementation",
                    "description": "Design tools, prototyping, and collaboration",
                    "order": 1,
                    "questions": [
                        choice("q26", "multi-choice", "Which design tools have you used professionally?", &[
                            "Figma", "Sketch", "Adobe XD", "InVision",
                        ], 0),
                        json!({
                            "id": "q29",
                            "type": "file-upload",
                            "question": "Upload a portfolio piece you are proud of.",
                            "required": false,
                            "order": 1,
                        }),
                        numeric("q30", "How many years of UX/UI design experience do you have?", 20.0, 2),
                    ],
                }),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DbAdapter;
    use talentflow_core::structure::validate_structure;
    use talentflow_core::{Assessment, Candidate, Job};

    #[test]
    fn preseed_documents_match_the_domain_model() {
        for doc in preseed_jobs() {
            serde_json::from_value::<Job>(doc).unwrap();
        }
        for doc in preseed_candidates() {
            serde_json::from_value::<Candidate>(doc).unwrap();
        }
        for doc in preseed_assessments() {
            let assessment: Assessment = serde_json::from_value(doc).unwrap();
            assert!(assessment.is_published);
            assert_eq!(validate_structure(&assessment), vec![], "{}", assessment.id);
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = DbAdapter::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();

        let first = ensure_seeded(&db).await.unwrap();
        assert_eq!(first, SeedReport { jobs: 4, candidates: CANDIDATE_COUNT, assessments: 3 });

        let second = ensure_seeded(&db).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(db.count(Collection::Assessments).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn only_empty_collections_are_filled() {
        let db = DbAdapter::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db.add(Collection::Jobs, "job-x", json!({"id": "job-x"})).await.unwrap();

        let report = ensure_seeded(&db).await.unwrap();
        assert_eq!(report.jobs, 0);
        assert_eq!(report.assessments, 3);
        assert_eq!(db.count(Collection::Jobs).await.unwrap(), 1);
    }
}

//! Structured resume payload returned by the extraction service.
//!
//! Every field may be absent: extraction quality varies by resume, and a
//! sparse payload is still scoreable. Absence never fails deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub personal_information: PersonalInformation,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub professional_experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub university: Option<String>,
    pub graduation_year: Option<String>,
    pub course: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    pub company: Option<String>,
    pub position: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Payload shape produced by the extraction service for a typical resume.
    const FULL_PAYLOAD: &str = r#"{
        "personal_information": {
            "name": "Dana Okafor",
            "email": "dana.okafor@example.com",
            "phone": "+1-555-0199"
        },
        "education": [
            {
                "university": "University of Lagos",
                "graduation_year": "2019",
                "course": "Computer Science",
                "gpa": "3.8"
            }
        ],
        "professional_experience": [
            {
                "company": "Northwind Analytics",
                "position": "Backend Engineer",
                "duration": "2019-2023",
                "responsibilities": [
                    "Built ingestion pipelines",
                    "Owned the billing service"
                ]
            }
        ],
        "skills": ["Rust", "PostgreSQL", "Kubernetes"],
        "certifications": ["CKA"],
        "projects": [
            {
                "name": "openmetrics-exporter",
                "description": "Prometheus exporter for custom workloads",
                "technologies": ["Rust", "Prometheus"]
            }
        ]
    }"#;

    #[test]
    fn full_payload_deserializes() {
        let parsed: ParsedResume = serde_json::from_str(FULL_PAYLOAD).unwrap();

        assert_eq!(parsed.personal_information.name.as_deref(), Some("Dana Okafor"));
        assert_eq!(parsed.education.len(), 1);
        assert_eq!(parsed.education[0].course.as_deref(), Some("Computer Science"));
        assert_eq!(parsed.professional_experience[0].responsibilities.len(), 2);
        assert_eq!(parsed.skills, vec!["Rust", "PostgreSQL", "Kubernetes"]);
        assert_eq!(parsed.projects[0].technologies, vec!["Rust", "Prometheus"]);
    }

    #[test]
    fn sparse_payload_falls_back_to_defaults() {
        let parsed: ParsedResume = serde_json::from_str("{}").unwrap();

        assert!(parsed.personal_information.name.is_none());
        assert!(parsed.education.is_empty());
        assert!(parsed.skills.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let parsed: ParsedResume =
            serde_json::from_str(r#"{"skills": ["Go"], "languages": ["en"]}"#).unwrap();

        assert_eq!(parsed.skills, vec!["Go"]);
    }

    #[test]
    fn round_trips_through_json() {
        let parsed: ParsedResume = serde_json::from_str(FULL_PAYLOAD).unwrap();
        let json = serde_json::to_value(&parsed).unwrap();

        assert_eq!(json["personal_information"]["name"], "Dana Okafor");
        assert_eq!(json["skills"][0], "Rust");
    }
}

//! Section editors: form records that turn one submitted form into a new,
//! full `CvSections` value.
//!
//! Education and experience keep only the latest submitted entry. Every other
//! list section appends, tagging the new entry with a timestamp id.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::models::cv_sections::{
    AwardEntry, CertificateEntry, CvSections, EducationEntry, EntryId, ExperienceEntry,
    LanguageEntry, ProjectEntry, SkillEntry,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{section} requires {}", .fields.join(", "))]
pub struct ValidationError {
    pub section: &'static str,
    pub fields: Vec<&'static str>,
}

/// Millisecond timestamp used as a locally generated entry id. Unique only in
/// practice.
pub fn next_entry_id() -> i64 {
    Utc::now().timestamp_millis()
}

// ────────────────────────────────────────────────────────────────────────────
// Forms
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionForm {
    #[serde(default)]
    pub introduction: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationForm {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub major: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceForm {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillForm {
    #[serde(default)]
    pub skill: String,
    pub experience: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageForm {
    #[serde(default)]
    pub language: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    #[serde(default)]
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateForm {
    #[serde(default)]
    pub name: String,
    pub organization: Option<String>,
    pub date: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardForm {
    #[serde(default)]
    pub name: String,
    pub organization: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// One submitted editor form, tagged by the section it edits.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "section", rename_all = "camelCase")]
pub enum SectionEdit {
    Introduction(IntroductionForm),
    Education(EducationForm),
    Experience(ExperienceForm),
    Skills(SkillForm),
    Languages(LanguageForm),
    Projects(ProjectForm),
    Certificates(CertificateForm),
    Awards(AwardForm),
}

impl SectionEdit {
    pub fn section(&self) -> &'static str {
        match self {
            SectionEdit::Introduction(_) => "introduction",
            SectionEdit::Education(_) => "education",
            SectionEdit::Experience(_) => "experience",
            SectionEdit::Skills(_) => "skills",
            SectionEdit::Languages(_) => "languages",
            SectionEdit::Projects(_) => "projects",
            SectionEdit::Certificates(_) => "certificates",
            SectionEdit::Awards(_) => "awards",
        }
    }

    /// Checks required fields. Nothing is applied when this fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required: Vec<(&'static str, &str)> = match self {
            SectionEdit::Introduction(_) => vec![],
            SectionEdit::Education(f) => {
                vec![("school", f.school.as_str()), ("major", f.major.as_str())]
            }
            SectionEdit::Experience(f) => vec![
                ("company", f.company.as_str()),
                ("position", f.position.as_str()),
            ],
            SectionEdit::Skills(f) => vec![("skill", f.skill.as_str())],
            SectionEdit::Languages(f) => vec![("language", f.language.as_str())],
            SectionEdit::Projects(f) => vec![("name", f.name.as_str())],
            SectionEdit::Certificates(f) => vec![("name", f.name.as_str())],
            SectionEdit::Awards(f) => vec![("name", f.name.as_str())],
        };

        let fields: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                section: self.section(),
                fields,
            })
        }
    }

    /// Validates, then builds the next `CvSections` from `current`.
    pub fn submit(
        self,
        current: CvSections,
        entry_id: i64,
    ) -> Result<CvSections, ValidationError> {
        self.validate()?;
        Ok(self.apply(current, entry_id))
    }

    fn apply(self, mut sections: CvSections, id: i64) -> CvSections {
        let id = Some(EntryId::from(id));
        match self {
            SectionEdit::Introduction(f) => {
                sections.introduction = f.introduction.trim().to_string();
            }
            SectionEdit::Education(f) => {
                // Only the latest education entry is kept.
                sections.education = vec![EducationEntry {
                    id,
                    school: f.school.trim().to_string(),
                    major: f.major.trim().to_string(),
                    from: optional(f.from),
                    to: optional(f.to),
                    description: optional(f.description),
                    ..Default::default()
                }];
            }
            SectionEdit::Experience(f) => {
                // Only the latest experience entry is kept.
                sections.experience = vec![ExperienceEntry {
                    id,
                    company: f.company.trim().to_string(),
                    position: f.position.trim().to_string(),
                    from: optional(f.from),
                    to: optional(f.to),
                    description: optional(f.description),
                    ..Default::default()
                }];
            }
            SectionEdit::Skills(f) => sections.skills.push(SkillEntry {
                id,
                skill: f.skill.trim().to_string(),
                experience: optional(f.experience),
                ..Default::default()
            }),
            SectionEdit::Languages(f) => sections.languages.push(LanguageEntry {
                id,
                language: f.language.trim().to_string(),
                level: optional(f.level),
                ..Default::default()
            }),
            SectionEdit::Projects(f) => sections.projects.push(ProjectEntry {
                id,
                name: f.name.trim().to_string(),
                from: optional(f.from),
                to: optional(f.to),
                description: optional(f.description),
                link: optional(f.link),
                ..Default::default()
            }),
            SectionEdit::Certificates(f) => sections.certificates.push(CertificateEntry {
                id,
                name: f.name.trim().to_string(),
                organization: optional(f.organization),
                date: optional(f.date),
                link: optional(f.link),
                ..Default::default()
            }),
            SectionEdit::Awards(f) => sections.awards.push(AwardEntry {
                id,
                name: f.name.trim().to_string(),
                organization: optional(f.organization),
                date: optional(f.date),
                description: optional(f.description),
                ..Default::default()
            }),
        }
        sections
    }
}

/// Blank form inputs are stored as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn education(school: &str, major: &str) -> SectionEdit {
        SectionEdit::Education(EducationForm {
            school: school.to_string(),
            major: major.to_string(),
            ..Default::default()
        })
    }

    fn skill(name: &str, level: &str) -> SectionEdit {
        SectionEdit::Skills(SkillForm {
            skill: name.to_string(),
            experience: Some(level.to_string()),
        })
    }

    #[test]
    fn test_education_replaces_existing_list() {
        let first = SectionEdit::Education(EducationForm {
            school: "A".to_string(),
            major: "B".to_string(),
            from: Some("2020".to_string()),
            to: Some("2024".to_string()),
            description: None,
        });
        let sections = first.submit(CvSections::default(), 100).unwrap();
        assert_eq!(
            serde_json::to_value(&sections.education).unwrap(),
            json!([{ "id": 100, "school": "A", "major": "B", "from": "2020", "to": "2024" }])
        );

        let sections = education("C", "D").submit(sections, 200).unwrap();
        assert_eq!(
            serde_json::to_value(&sections.education).unwrap(),
            json!([{ "id": 200, "school": "C", "major": "D" }])
        );
    }

    #[test]
    fn test_education_replaces_list_of_any_length() {
        let mut current = CvSections::default();
        for id in 0..3_i64 {
            current.education.push(EducationEntry {
                id: Some(EntryId::from(id)),
                school: format!("S{id}"),
                major: "M".to_string(),
                ..Default::default()
            });
        }
        let sections = education("New", "Major").submit(current, 9).unwrap();
        assert_eq!(sections.education.len(), 1);
        assert_eq!(sections.education[0].school, "New");
        assert_eq!(sections.education[0].id, Some(EntryId::Number(9)));
    }

    #[test]
    fn test_experience_keeps_only_latest() {
        let edit = |company: &str| {
            SectionEdit::Experience(ExperienceForm {
                company: company.to_string(),
                position: "Engineer".to_string(),
                ..Default::default()
            })
        };
        let sections = edit("Acme").submit(CvSections::default(), 1).unwrap();
        let sections = edit("Globex").submit(sections, 2).unwrap();
        assert_eq!(sections.experience.len(), 1);
        assert_eq!(sections.experience[0].company, "Globex");
    }

    #[test]
    fn test_skills_append_in_submission_order() {
        let sections = skill("React", "1-2 năm")
            .submit(CvSections::default(), 1)
            .unwrap();
        let sections = skill("Go", "Dưới 1 năm").submit(sections, 2).unwrap();

        assert_eq!(sections.skills.len(), 2);
        assert_eq!(sections.skills[0].skill, "React");
        assert_eq!(sections.skills[0].experience.as_deref(), Some("1-2 năm"));
        assert_eq!(sections.skills[1].skill, "Go");
        assert_eq!(sections.skills[1].id, Some(EntryId::Number(2)));
    }

    #[test]
    fn test_append_sections_leave_other_sections_untouched() {
        let current = education("A", "B").submit(CvSections::default(), 1).unwrap();
        let edit = SectionEdit::Awards(AwardForm {
            name: "Best Paper".to_string(),
            organization: Some("  ".to_string()),
            ..Default::default()
        });
        let sections = edit.submit(current.clone(), 2).unwrap();
        assert_eq!(sections.education, current.education);
        assert_eq!(sections.awards.len(), 1);
        assert_eq!(sections.awards[0].organization, None);
    }

    #[test]
    fn test_education_requires_school_and_major() {
        let err = education(" ", "").submit(CvSections::default(), 1).unwrap_err();
        assert_eq!(err.section, "education");
        assert_eq!(err.fields, vec!["school", "major"]);
        assert_eq!(err.to_string(), "education requires school, major");

        assert!(education("A", "").validate().is_err());
    }

    #[test]
    fn test_required_name_for_list_sections() {
        let edits = [
            SectionEdit::Languages(LanguageForm::default()),
            SectionEdit::Projects(ProjectForm::default()),
            SectionEdit::Certificates(CertificateForm::default()),
            SectionEdit::Awards(AwardForm::default()),
            SectionEdit::Skills(SkillForm::default()),
        ];
        for edit in edits {
            assert!(edit.validate().is_err(), "{} should fail", edit.section());
        }
    }

    #[test]
    fn test_introduction_is_set_not_appended() {
        let edit = SectionEdit::Introduction(IntroductionForm {
            introduction: "  Backend engineer  ".to_string(),
        });
        let sections = edit
            .submit(
                CvSections {
                    introduction: "old".to_string(),
                    ..Default::default()
                },
                1,
            )
            .unwrap();
        assert_eq!(sections.introduction, "Backend engineer");
    }

    #[test]
    fn test_edit_decodes_from_tagged_json() {
        let edit: SectionEdit = serde_json::from_value(json!({
            "section": "languages",
            "language": "English",
            "level": "IELTS 7.0"
        }))
        .unwrap();
        assert_eq!(edit.section(), "languages");

        let edit: SectionEdit =
            serde_json::from_value(json!({ "section": "education", "school": "A" })).unwrap();
        assert!(edit.validate().is_err());
    }
}

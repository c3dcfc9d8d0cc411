//! Plain-data records describing the government service catalog.
//!
//! A [`Catalog`] is the unit of import: it is deserialized from a TOML
//! file by the application and either written to SQLite or loaded into an
//! [`InMemoryCatalog`](crate::store::memory::InMemoryCatalog).
//!
//! ```toml
//! [[entities]]
//! id = 1
//! name = "المديرية العامة للمرور"
//! url = "https://www.moi.gov.sa"
//!
//! [[services]]
//! id = 10
//! entity_id = 1
//! name = "تجديد رخصة القيادة"
//! keyword = "تجديد رخصة"
//!
//! [[journeys]]
//! id = 1
//! name = "رحلة بناء منزل"
//! keyword = "بناء منزل"
//! services = [10]
//! ```

use serde::{Deserialize, Serialize};

/// The full relational catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub journeys: Vec<Journey>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub requirements: Vec<RequirementDefinition>,
    #[serde(default)]
    pub step_requirements: Vec<StepRequirement>,
}

/// A government organization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entity {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// A single procedure offered by one entity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Service {
    pub id: i64,
    pub entity_id: i64,
    pub name: String,
    #[serde(default)]
    pub keyword: Option<String>,
}

/// A multi-service bundle. `services` lists service ids in journey order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Journey {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub services: Vec<i64>,
}

/// An ordered sub-task of a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Step {
    pub id: i64,
    pub service_id: i64,
    pub order: i64,
    pub description: String,
}

/// A document or condition that steps may require.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequirementDefinition {
    pub id: i64,
    pub display_name: String,
    #[serde(default)]
    pub source_type: Option<String>,
}

/// Links a requirement definition to a step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepRequirement {
    pub id: i64,
    pub step_id: i64,
    pub requirement_id: i64,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Catalog {
    /// Check referential integrity before the catalog is stored anywhere.
    pub fn validate(&self) -> anyhow::Result<()> {
        use std::collections::HashSet;

        let entity_ids: HashSet<i64> = self.entities.iter().map(|e| e.id).collect();
        let service_ids: HashSet<i64> = self.services.iter().map(|s| s.id).collect();
        let step_ids: HashSet<i64> = self.steps.iter().map(|s| s.id).collect();
        let req_ids: HashSet<i64> = self.requirements.iter().map(|r| r.id).collect();

        for service in &self.services {
            if !entity_ids.contains(&service.entity_id) {
                anyhow::bail!(
                    "service {} references unknown entity {}",
                    service.id,
                    service.entity_id
                );
            }
        }
        for journey in &self.journeys {
            let mut listed = HashSet::new();
            for sid in &journey.services {
                if !service_ids.contains(sid) {
                    anyhow::bail!("journey {} references unknown service {}", journey.id, sid);
                }
                if !listed.insert(*sid) {
                    anyhow::bail!("journey {} lists service {} twice", journey.id, sid);
                }
            }
        }
        for step in &self.steps {
            if !service_ids.contains(&step.service_id) {
                anyhow::bail!(
                    "step {} references unknown service {}",
                    step.id,
                    step.service_id
                );
            }
        }
        for link in &self.step_requirements {
            if !step_ids.contains(&link.step_id) {
                anyhow::bail!(
                    "step requirement {} references unknown step {}",
                    link.id,
                    link.step_id
                );
            }
            if !req_ids.contains(&link.requirement_id) {
                anyhow::bail!(
                    "step requirement {} references unknown requirement {}",
                    link.id,
                    link.requirement_id
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_catalog() {
        let catalog: Catalog = toml::from_str(
            r#"
            [[entities]]
            id = 1
            name = "المرور"
            url = "https://example.gov.sa"

            [[services]]
            id = 10
            entity_id = 1
            name = "تجديد رخصة القيادة"

            [[steps]]
            id = 100
            service_id = 10
            order = 1
            description = "تسجيل الدخول"

            [[requirements]]
            id = 5
            display_name = "صورة الهوية"

            [[step_requirements]]
            id = 1
            step_id = 100
            requirement_id = 5
            "#,
        )
        .unwrap();

        assert_eq!(catalog.services[0].keyword, None);
        assert!(catalog.step_requirements[0].required);
        assert!(catalog.journeys.is_empty());
        catalog.validate().unwrap();
    }

    #[test]
    fn rejects_dangling_references() {
        let catalog = Catalog {
            services: vec![Service {
                id: 1,
                entity_id: 99,
                name: "x".into(),
                keyword: None,
            }],
            ..Default::default()
        };
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("unknown entity 99"));
    }
}

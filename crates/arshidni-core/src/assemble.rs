//! Context assembly.
//!
//! Folds the flat, ordered [`JoinedRow`] sequence into a hierarchical
//! [`ContextDocument`]: a title, one block per service (entity name and URL),
//! and under each service one block per step with its requirements.
//!
//! # Grouping rules
//!
//! 1. Service blocks appear in first-seen order of the service name. A
//!    service that reappears later in the sequence (for example because it
//!    belongs to two journeys) is folded into its existing block.
//! 2. Within a service, step blocks appear in first-seen order of the step
//!    description.
//! 3. Requirements attach to the exact `(service, step_description)` pair
//!    and are deduplicated by display name.
//!
//! All three indexes are built in a single pass over the rows.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::models::{JoinedRow, TargetKind};

/// Rendered in place of a document when there are no rows at all.
pub const NO_ROWS_PLACEHOLDER: &str = "لا تتوفر بيانات محددة لهذه الخدمة/الرحلة.";

const TITLE_PREFIX: &str = "## البيانات المستخرجة من قاعدة بيانات الدليل الحكومي لـ:";
const REQUIREMENTS_LABEL: &str = "المتطلبات التفصيلية:";
const NO_REQUIREMENTS: &str = "لا يوجد.";
const NO_STEPS: &str = "لا توجد خطوات مسجلة لهذه الخدمة.";
const MANDATORY: &str = "إلزامي";
const OPTIONAL: &str = "اختياري";
const UNKNOWN_SOURCE: &str = "غير محدد";

/// A requirement attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementLine {
    pub name: String,
    pub required: bool,
    pub source: Option<String>,
}

impl fmt::Display for RequirementLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.required { MANDATORY } else { OPTIONAL };
        let source = self.source.as_deref().unwrap_or(UNKNOWN_SOURCE);
        write!(f, "{} ({} - المصدر: {})", self.name, status, source)
    }
}

/// One step of a service and its deduplicated requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBlock {
    pub order: Option<i64>,
    pub description: String,
    pub requirements: Vec<RequirementLine>,
}

/// One service with its owning entity and steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceBlock {
    pub service_name: String,
    pub entity_name: String,
    pub entity_url: String,
    pub steps: Vec<StepBlock>,
}

/// The assembled context, renderable as a single text blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ContextDocument {
    pub title: String,
    pub services: Vec<ServiceBlock>,
}

impl ContextDocument {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// The document as ordered text blocks. Joining them with `\n` gives
    /// the rendered context.
    pub fn blocks(&self) -> Vec<String> {
        if self.is_empty() {
            return vec![NO_ROWS_PLACEHOLDER.to_string()];
        }

        let mut blocks = vec![format!("{} {}", TITLE_PREFIX, self.title)];
        for service in &self.services {
            blocks.push(format!("\n--- [خدمة: {}] ---", service.service_name));
            blocks.push(format!(
                "الجهة: {}. الرابط: {}",
                service.entity_name, service.entity_url
            ));
            if service.steps.is_empty() {
                blocks.push(NO_STEPS.to_string());
            }
            for step in &service.steps {
                match step.order {
                    Some(order) => blocks.push(format!("\nالخطوة {}: {}", order, step.description)),
                    None => blocks.push(format!("\nالخطوة: {}", step.description)),
                }
                if step.requirements.is_empty() {
                    blocks.push(format!("{} {}", REQUIREMENTS_LABEL, NO_REQUIREMENTS));
                } else {
                    let joined: Vec<String> =
                        step.requirements.iter().map(|r| r.to_string()).collect();
                    blocks.push(format!("{} {}", REQUIREMENTS_LABEL, joined.join(" | ")));
                }
            }
        }
        blocks
    }

    pub fn render(&self) -> String {
        self.blocks().join("\n")
    }
}

impl fmt::Display for ContextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Build the context document for `rows` resolved as `kind`.
pub fn assemble(rows: &[JoinedRow], kind: TargetKind) -> ContextDocument {
    let Some(first) = rows.first() else {
        return ContextDocument::default();
    };

    let title = match kind {
        TargetKind::Journey => first
            .journey_name
            .clone()
            .unwrap_or_else(|| first.service_name.clone()),
        TargetKind::Service => first.service_name.clone(),
    };

    let mut services: Vec<ServiceBlock> = Vec::new();
    let mut service_index: HashMap<&str, usize> = HashMap::new();
    let mut step_index: HashMap<(usize, &str), usize> = HashMap::new();
    let mut seen_requirements: HashSet<(usize, usize, &str)> = HashSet::new();

    for row in rows {
        let s = *service_index
            .entry(row.service_name.as_str())
            .or_insert_with(|| {
                services.push(ServiceBlock {
                    service_name: row.service_name.clone(),
                    entity_name: row.entity_name.clone(),
                    entity_url: row.entity_url.clone(),
                    steps: Vec::new(),
                });
                services.len() - 1
            });

        let Some(description) = row.step_description.as_deref() else {
            continue;
        };

        let steps = &mut services[s].steps;
        let t = *step_index.entry((s, description)).or_insert_with(|| {
            steps.push(StepBlock {
                order: row.step_order,
                description: description.to_string(),
                requirements: Vec::new(),
            });
            steps.len() - 1
        });

        if let Some(name) = row.requirement_name.as_deref() {
            if seen_requirements.insert((s, t, name)) {
                steps[t].requirements.push(RequirementLine {
                    name: name.to_string(),
                    required: row.requirement_required.unwrap_or(false),
                    source: row.requirement_source.clone(),
                });
            }
        }
    }

    ContextDocument { title, services }
}

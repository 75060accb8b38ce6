//! Validation and atomic commit of node property edits.
//!
//! Candidate values arrive as the raw text of a property form. All fields are
//! checked before anything is written; a node is either fully updated or left
//! untouched.

use std::fmt;

use qnet_core::{NodeAttributes, NodeId, NodeType, QubitTech};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::EditorResult;
use crate::model::GraphModel;

/// An editable node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyField {
    #[serde(rename = "type")]
    NodeType,
    NumQubits,
    QubitTech,
    CoherenceTime,
    InsertionLoss,
}

impl PropertyField {
    /// Field name as it appears in documents.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyField::NodeType => "type",
            PropertyField::NumQubits => "num_qubits",
            PropertyField::QubitTech => "qubit_tech",
            PropertyField::CoherenceTime => "coherence_time",
            PropertyField::InsertionLoss => "insertion_loss",
        }
    }
}

impl fmt::Display for PropertyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: PropertyField,
    pub message: String,
}

impl ValidationError {
    fn new(field: PropertyField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Proposed values for every editable property of a node.
///
/// Enumerated fields are closed choices; numeric fields hold unparsed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFields {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub num_qubits: String,
    pub qubit_tech: QubitTech,
    pub coherence_time: String,
    pub insertion_loss: String,
}

impl CandidateFields {
    /// Pre-populate a form from a node's current attributes.
    pub fn from_attributes(attributes: &NodeAttributes) -> Self {
        Self {
            node_type: attributes.node_type,
            num_qubits: attributes.num_qubits.to_string(),
            qubit_tech: attributes.qubit_tech,
            coherence_time: attributes.coherence_time.to_string(),
            insertion_loss: attributes.insertion_loss.to_string(),
        }
    }
}

/// A partial edit: only the fields that are set replace the current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub num_qubits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubit_tech: Option<QubitTech>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub coherence_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub insertion_loss: Option<String>,
}

impl PropertyPatch {
    /// Overlay this patch on a full set of candidate values.
    pub fn apply_to(&self, mut candidate: CandidateFields) -> CandidateFields {
        if let Some(node_type) = self.node_type {
            candidate.node_type = node_type;
        }
        if let Some(qubit_tech) = self.qubit_tech {
            candidate.qubit_tech = qubit_tech;
        }
        if let Some(v) = &self.num_qubits {
            candidate.num_qubits = v.clone();
        }
        if let Some(v) = &self.coherence_time {
            candidate.coherence_time = v.clone();
        }
        if let Some(v) = &self.insertion_loss {
            candidate.insertion_loss = v.clone();
        }
        candidate
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Number(n) => n.to_string(),
        }
    }
}

/// Accept `"4"` as well as `4` for numeric form fields.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawValue>::deserialize(deserializer)?.map(RawValue::into_text))
}

/// Like `text_or_number` for a required field.
pub(crate) fn required_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawValue::deserialize(deserializer).map(RawValue::into_text)
}

/// Check every field and build the resulting attributes.
///
/// The error names the first failing field in form order.
pub fn validate(candidate: &CandidateFields) -> Result<NodeAttributes, ValidationError> {
    let num_qubits = parse_num_qubits(&candidate.num_qubits)?;
    let coherence_time = parse_non_negative(
        &candidate.coherence_time,
        PropertyField::CoherenceTime,
        "Coherence Time must be a non-negative number.",
    )?;
    let insertion_loss = parse_non_negative(
        &candidate.insertion_loss,
        PropertyField::InsertionLoss,
        "Photon Insertion Loss must be a non-negative number.",
    )?;

    Ok(NodeAttributes {
        node_type: candidate.node_type,
        num_qubits,
        qubit_tech: candidate.qubit_tech,
        coherence_time,
        insertion_loss,
    })
}

/// Validate `candidate` and, only if every field passes, apply it to the node.
pub fn commit(
    model: &mut GraphModel,
    id: NodeId,
    candidate: &CandidateFields,
) -> EditorResult<NodeAttributes> {
    if !model.contains_node(id) {
        return Err(crate::error::EditorError::node_not_found(id));
    }

    let attributes = validate(candidate).inspect_err(|err| {
        warn!(node = %id, field = %err.field, "Rejected property edit");
    })?;

    model.set_node_attributes(id, attributes)?;
    debug!(node = %id, node_type = %attributes.node_type, "Committed node properties");
    Ok(attributes)
}

fn parse_num_qubits(text: &str) -> Result<u32, ValidationError> {
    const MESSAGE: &str = "Number of Qubits must be a positive integer.";
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(PropertyField::NumQubits, MESSAGE))?;
    if value < 1 {
        return Err(ValidationError::new(PropertyField::NumQubits, MESSAGE));
    }
    u32::try_from(value).map_err(|_| ValidationError::new(PropertyField::NumQubits, MESSAGE))
}

fn parse_non_negative(
    text: &str,
    field: PropertyField,
    message: &str,
) -> Result<f64, ValidationError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(field, message))?;
    // NaN fails the comparison; infinities cannot be persisted as JSON.
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(field, message));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qnet_core::Position;

    fn candidate(num_qubits: &str, coherence: &str, loss: &str) -> CandidateFields {
        CandidateFields {
            node_type: NodeType::Repeater,
            num_qubits: num_qubits.to_string(),
            qubit_tech: QubitTech::Ions,
            coherence_time: coherence.to_string(),
            insertion_loss: loss.to_string(),
        }
    }

    #[test]
    fn test_valid_candidate() {
        let attrs = validate(&candidate(" 4 ", "2.5", "0")).unwrap();
        assert_eq!(attrs.num_qubits, 4);
        assert_eq!(attrs.coherence_time, 2.5);
        assert_eq!(attrs.insertion_loss, 0.0);
        assert_eq!(attrs.node_type, NodeType::Repeater);
        assert_eq!(attrs.qubit_tech, QubitTech::Ions);
    }

    #[test]
    fn test_num_qubits_rejections() {
        for bad in ["0", "-3", "2.0", "many", "", "99999999999"] {
            let err = validate(&candidate(bad, "1", "1")).unwrap_err();
            assert_eq!(err.field, PropertyField::NumQubits, "input {:?}", bad);
        }
    }

    #[test]
    fn test_float_rejections() {
        let err = validate(&candidate("1", "-0.1", "1")).unwrap_err();
        assert_eq!(err.field, PropertyField::CoherenceTime);

        let err = validate(&candidate("1", "1", "lossy")).unwrap_err();
        assert_eq!(err.field, PropertyField::InsertionLoss);

        let err = validate(&candidate("1", "NaN", "1")).unwrap_err();
        assert_eq!(err.field, PropertyField::CoherenceTime);

        let err = validate(&candidate("1", "1", "inf")).unwrap_err();
        assert_eq!(err.field, PropertyField::InsertionLoss);
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        let err = validate(&candidate("0", "-1", "-1")).unwrap_err();
        assert_eq!(err.field, PropertyField::NumQubits);
        assert_eq!(err.field.name(), "num_qubits");
    }

    #[test]
    fn test_commit_is_atomic() {
        let mut model = GraphModel::new();
        let id = model.add_node(Position::new(0.0, 0.0), None).unwrap();
        let before = *model.node(id).unwrap().attributes();

        let mut fields = candidate("0", "5.0", "0");
        fields.node_type = NodeType::Detector;
        let err = commit(&mut model, id, &fields).unwrap_err();

        assert!(matches!(
            err,
            crate::error::EditorError::Validation(ValidationError {
                field: PropertyField::NumQubits,
                ..
            })
        ));
        assert_eq!(*model.node(id).unwrap().attributes(), before);
    }

    #[test]
    fn test_commit_updates_appearance() {
        let mut model = GraphModel::new();
        let id = model.add_node(Position::new(0.0, 0.0), None).unwrap();
        model.take_events();

        commit(&mut model, id, &candidate("2", "1.5", "0.3")).unwrap();

        let node = model.node(id).unwrap();
        assert_eq!(node.attributes().num_qubits, 2);
        assert_eq!(node.fill_color(), NodeType::Repeater.fill_color());
        assert!(model
            .take_events()
            .iter()
            .any(|e| matches!(e, crate::model::ModelEvent::AppearanceChanged { .. })));
    }

    #[test]
    fn test_patch_overlays_and_accepts_numbers() {
        let patch: PropertyPatch =
            serde_json::from_str(r#"{"type": "detector", "num_qubits": 3, "coherence_time": "0.5"}"#)
                .unwrap();
        let fields = patch.apply_to(CandidateFields::from_attributes(&NodeAttributes::default()));

        let attrs = validate(&fields).unwrap();
        assert_eq!(attrs.node_type, NodeType::Detector);
        assert_eq!(attrs.num_qubits, 3);
        assert_eq!(attrs.coherence_time, 0.5);
        assert_eq!(attrs.qubit_tech, QubitTech::ColorCenters);
        assert!(PropertyPatch::default().is_empty());
    }

    #[test]
    fn test_from_attributes_roundtrips() {
        let attrs = NodeAttributes::default();
        let fields = CandidateFields::from_attributes(&attrs);
        assert_eq!(validate(&fields).unwrap(), attrs);
    }
}

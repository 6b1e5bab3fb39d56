use crate::protocol::MutateRequest;

/// One adjustment of a write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutateOption {
    /// Unique properties that identify an existing entity to update instead of creating one
    OnConflictUseId(Vec<String>),
    /// Only write the named properties
    MutateProperties(Vec<String>),
}

impl MutateOption {
    pub fn apply(&self, request: &mut MutateRequest) {
        match self {
            MutateOption::OnConflictUseId(properties) => {
                request.conflict_unique_properties = properties.clone();
            }
            MutateOption::MutateProperties(keep) => {
                request
                    .mutation
                    .properties
                    .retain(|property| keep.contains(&property.name));
            }
        }
    }
}

pub fn on_conflict_use_id(properties: &[&str]) -> MutateOption {
    MutateOption::OnConflictUseId(properties.iter().map(|s| s.to_string()).collect())
}

pub fn mutate_properties(properties: &[&str]) -> MutateOption {
    MutateOption::MutateProperties(properties.iter().map(|s| s.to_string()).collect())
}

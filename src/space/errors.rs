use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpaceError {
    #[error("cannot flatten a space of kind `{0}`")]
    UnsupportedSpaceKind(String),

    #[error("flattened size of a `{0}` space does not fit in usize")]
    DimensionOverflow(String),
}

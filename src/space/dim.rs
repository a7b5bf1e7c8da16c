use super::{Space, SpaceError};

/// Number of scalars needed to represent `space` as a flat vector.
///
/// Composite spaces sum their children. Variable-length kinds have no fixed
/// flat size and fail with [`SpaceError::UnsupportedSpaceKind`], even when
/// nested deep inside a tuple or dict. A size that does not fit in `usize`
/// fails with [`SpaceError::DimensionOverflow`].
pub fn num_space_dim(space: &Space) -> Result<usize, SpaceError> {
    match space {
        Space::Continuous { shape } | Space::MultiDiscrete { shape } => product(space, shape),
        Space::Discrete { n } | Space::MultiBinary { n } => Ok(*n),
        Space::Tuple(spaces) => sum(space, spaces.iter()),
        Space::Dict(spaces) => sum(space, spaces.values()),
        Space::Text { .. } | Space::Sequence(_) => {
            Err(SpaceError::UnsupportedSpaceKind(space.kind().to_string()))
        }
    }
}

fn product(space: &Space, shape: &[usize]) -> Result<usize, SpaceError> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        acc.checked_mul(dim)
            .ok_or_else(|| SpaceError::DimensionOverflow(space.kind().to_string()))
    })
}

fn sum<'a>(space: &Space, mut children: impl Iterator<Item = &'a Space>) -> Result<usize, SpaceError> {
    children.try_fold(0usize, |acc, child| {
        acc.checked_add(num_space_dim(child)?)
            .ok_or_else(|| SpaceError::DimensionOverflow(space.kind().to_string()))
    })
}

impl Space {
    pub fn flat_dim(&self) -> Result<usize, SpaceError> {
        num_space_dim(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_leaf_spaces() {
        assert_eq!(num_space_dim(&Space::continuous([3, 4])), Ok(12));
        assert_eq!(num_space_dim(&Space::discrete(5)), Ok(5));
        assert_eq!(num_space_dim(&Space::MultiBinary { n: 7 }), Ok(7));
        assert_eq!(
            num_space_dim(&Space::MultiDiscrete { shape: vec![2, 3] }),
            Ok(6)
        );
    }

    #[test]
    fn test_scalar_box_has_one_dim() {
        // An empty shape is a scalar, same as numpy's prod(()).
        assert_eq!(num_space_dim(&Space::continuous(Vec::new())), Ok(1));
    }

    #[test]
    fn test_nested_composites_sum_children() {
        let mut inner = BTreeMap::new();
        inner.insert("position".to_string(), Space::continuous([3]));
        inner.insert("gripper".to_string(), Space::discrete(2));

        let space = Space::Tuple(vec![
            Space::continuous([2, 2]),
            Space::Dict(inner.clone()),
            Space::Tuple(vec![Space::MultiBinary { n: 4 }, Space::Dict(inner)]),
        ]);

        // 4 + (3 + 2) + (4 + (3 + 2))
        assert_eq!(space.flat_dim(), Ok(18));
    }

    #[test]
    fn test_dict_ignores_key_order() {
        let a: BTreeMap<_, _> = [
            ("a".to_string(), Space::discrete(3)),
            ("b".to_string(), Space::continuous([5])),
        ]
        .into_iter()
        .collect();
        let b: BTreeMap<_, _> = [
            ("z".to_string(), Space::continuous([5])),
            ("y".to_string(), Space::discrete(3)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            num_space_dim(&Space::Dict(a)),
            num_space_dim(&Space::Dict(b))
        );
    }

    #[test]
    fn test_empty_composites() {
        assert_eq!(num_space_dim(&Space::Tuple(vec![])), Ok(0));
        assert_eq!(num_space_dim(&Space::Dict(BTreeMap::new())), Ok(0));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(
            num_space_dim(&Space::continuous([usize::MAX, 2])),
            Err(SpaceError::DimensionOverflow("continuous".to_string()))
        );
        // a zero-sized axis never overflows
        assert_eq!(num_space_dim(&Space::continuous([usize::MAX, 0])), Ok(0));

        let wide = Space::Tuple(vec![Space::discrete(usize::MAX), Space::discrete(1)]);
        assert_eq!(
            wide.flat_dim(),
            Err(SpaceError::DimensionOverflow("tuple".to_string()))
        );

        let mut nested = BTreeMap::new();
        nested.insert(
            "grid".to_string(),
            Space::MultiDiscrete {
                shape: vec![usize::MAX / 2, 3],
            },
        );
        assert_eq!(
            num_space_dim(&Space::Dict(nested)),
            Err(SpaceError::DimensionOverflow("multi_discrete".to_string()))
        );
    }

    #[test]
    fn test_unsupported_kinds_fail() {
        assert_eq!(
            num_space_dim(&Space::Text { max_length: 8 }),
            Err(SpaceError::UnsupportedSpaceKind("text".to_string()))
        );

        let nested = Space::Tuple(vec![
            Space::discrete(2),
            Space::Sequence(Box::new(Space::discrete(2))),
        ]);
        assert_eq!(
            nested.flat_dim(),
            Err(SpaceError::UnsupportedSpaceKind("sequence".to_string()))
        );
    }
}

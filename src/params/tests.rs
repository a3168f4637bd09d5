use super::*;
use candle_core::{DType, Device};

fn var(shape: (usize, usize)) -> Var {
    Var::zeros(shape, DType::F32, &Device::Cpu).expect("allocate var")
}

#[test]
fn test_extend_prefixed_names() {
    let mut inner = ParameterSet::new();
    inner.insert("proj.weight", var((2, 2)));
    inner.insert("proj.bias", var((1, 2)));

    let mut outer = ParameterSet::new();
    outer.insert("to_pred.weight", var((1, 2)));
    outer.extend_prefixed("backbone", inner);

    let names: Vec<&str> = outer.names().collect();
    assert_eq!(
        names,
        vec!["backbone.proj.bias", "backbone.proj.weight", "to_pred.weight"]
    );
}

#[test]
fn test_contains_tensor_is_identity_based() {
    let a = var((2, 2));
    let b = var((2, 2));

    let mut set = ParameterSet::new();
    set.insert("a", a.clone());

    assert!(set.contains_tensor(a.as_tensor()));
    assert!(!set.contains_tensor(b.as_tensor()));
}

#[test]
fn test_union_and_counts() {
    let mut left = ParameterSet::new();
    left.insert("a", var((2, 3)));
    let mut right = ParameterSet::new();
    right.insert("b", var((4, 1)));

    let merged = left.union(right);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.num_elements(), 10);
    assert_eq!(merged.vars().len(), 2);
    assert!(!merged.is_empty());
}

#[test]
fn test_to_tensors_snapshot() {
    let mut set = ParameterSet::new();
    set.insert("w", var((1, 3)));

    let tensors = set.to_tensors();
    assert_eq!(tensors.len(), 1);
    assert_eq!(tensors["w"].dims(), &[1, 3]);
}

#[test]
fn test_from_iterator() {
    let set: ParameterSet = vec![("x".to_string(), var((1, 1)))].into_iter().collect();
    assert!(set.get("x").is_some());
    assert!(set.get("y").is_none());
}

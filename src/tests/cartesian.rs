use super::*;

fn collect(space: &[Vec<u32>]) -> Vec<Vec<u32>> {
    AdvancingIterator::new(space)
        .map(|combo| combo.into_iter().copied().collect())
        .collect()
}

#[test]
fn enumerates_full_product_last_dimension_fastest() {
    let space = vec![vec![0, 1], vec![10, 11, 12]];
    assert_eq!(
        collect(&space),
        vec![
            vec![0, 10],
            vec![0, 11],
            vec![0, 12],
            vec![1, 10],
            vec![1, 11],
            vec![1, 12],
        ]
    );
}

#[test]
fn single_dimension_steps_through_every_value() {
    let space = vec![vec![4, 5, 6]];
    assert_eq!(collect(&space), vec![vec![4], vec![5], vec![6]]);
}

#[test]
fn empty_dimension_means_empty_product() {
    let space: Vec<Vec<u32>> = vec![vec![1, 2], vec![]];
    assert!(collect(&space).is_empty());
    assert_eq!(space_size(&space), 0);
    assert!(!AdvancingIterator::new(&space).has_next());
}

#[test]
fn no_dimensions_means_empty_product() {
    let space: Vec<Vec<u32>> = Vec::new();
    assert!(collect(&space).is_empty());
}

#[test]
fn size_is_product_of_lengths() {
    let space = vec![vec![0; 3], vec![0; 4], vec![0; 5]];
    assert_eq!(AdvancingIterator::new(&space).size(), 60);
}

#[test]
fn advance_skips_sub_cube() {
    let space = vec![vec![0, 1], vec![0, 1], vec![0, 1]];
    let mut iter = AdvancingIterator::new(&space);

    let first: Vec<u32> = iter.next().unwrap().into_iter().copied().collect();
    assert_eq!(first, vec![0, 0, 0]);

    // Everything starting with 0 is ruled out.
    iter.advance(0);
    let next: Vec<u32> = iter.next().unwrap().into_iter().copied().collect();
    assert_eq!(next, vec![1, 0, 0]);

    // Everything starting with 1, 0 is ruled out.
    iter.advance(1);
    let next: Vec<u32> = iter.next().unwrap().into_iter().copied().collect();
    assert_eq!(next, vec![1, 1, 0]);
}

#[test]
fn advance_on_last_dimension_is_plain_next() {
    let space = vec![vec![0, 1], vec![0, 1]];
    let mut iter = AdvancingIterator::new(&space);
    iter.next();
    iter.advance(1);
    let next: Vec<u32> = iter.next().unwrap().into_iter().copied().collect();
    assert_eq!(next, vec![0, 1]);
}

#[test]
fn advance_past_end_exhausts() {
    let space = vec![vec![0, 1], vec![0, 1]];
    let mut iter = AdvancingIterator::new(&space);
    iter.next();
    iter.next();
    iter.next(); // [1, 0]
    iter.advance(0);
    assert!(!iter.has_next());
    assert!(iter.next().is_none());
}

#[test]
fn advance_before_next_is_ignored() {
    let space = vec![vec![0, 1], vec![0, 1]];
    let mut iter = AdvancingIterator::new(&space);
    iter.advance(0);
    assert_eq!(iter.count(), 4);
}

use augtree::{ordmap, OrderedMap};

#[test]
fn insert_get_remove_roundtrip() {
    let mut map: OrderedMap<i32, &str> = OrderedMap::new();
    assert!(map.is_empty());

    assert_eq!(map.insert(5, "five"), None);
    assert_eq!(map.insert(3, "three"), None);
    assert_eq!(map.insert(8, "eight"), None);
    assert_eq!(map.len(), 3);

    assert_eq!(map.get(&3), Some(&"three"));
    assert_eq!(map.get(&100), None);

    assert_eq!(map.insert(3, "tres"), Some("three"));
    assert_eq!(map.get(&3), Some(&"tres"));
    assert_eq!(map.len(), 3);

    assert_eq!(map.remove(&3), Some("tres"));
    assert_eq!(map.get(&3), None);
    assert_eq!(map.len(), 2);
}

#[test]
fn iteration_is_sorted() {
    let map: OrderedMap<i32, i32> = [5, 3, 8, 1, 4, 7, 9, 2, 6]
        .into_iter()
        .map(|v| (v, v * 10))
        .collect();

    let collected: Vec<(i32, i32)> = map.iter().map(|(k, v)| (k, *v)).collect();
    let expected: Vec<(i32, i32)> = (1..=9).map(|v| (v, v * 10)).collect();
    assert_eq!(collected, expected);

    assert_eq!(map.first_key_value(), Some((&1, &10)));
    assert_eq!(map.last_key_value(), Some((&9, &90)));
}

#[test]
fn macro_construction() {
    let m = ordmap! { "a" => 1, "b" => 2, "c" => 3 };
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&"b"), Some(&2));

    let empty: OrderedMap<i32, i32> = ordmap!();
    assert!(empty.is_empty());
}

#[test]
fn contains_key_and_mutation() {
    let mut map: OrderedMap<&str, i32> = OrderedMap::new();
    map.insert("count", 0);
    assert!(map.contains_key(&"count"));
    assert!(!map.contains_key(&"missing"));

    *map.get_mut(&"count").unwrap() += 1;
    assert_eq!(map.get(&"count"), Some(&1));

    map.clear();
    assert!(map.is_empty());
    assert!(!map.contains_key(&"count"));
}

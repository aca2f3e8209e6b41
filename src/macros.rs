/// Construct an [`OrderedMap`](crate::OrderedMap) from `key => value` pairs,
/// mirroring `std::collections`-adjacent literal-construction macros.
///
/// ```
/// use augtree::ordmap;
/// let m = ordmap! { "a" => 1, "b" => 2 };
/// assert_eq!(m.get(&"a"), Some(&1));
/// ```
#[macro_export]
macro_rules! ordmap {
    () => {
        $crate::OrderedMap::new()
    };
    ($($key:expr => $val:expr),+ $(,)?) => {{
        let mut map = $crate::OrderedMap::new();
        $(map.insert($key, $val);)+
        map
    }};
}

/// Construct a [`SequenceList`](crate::SequenceList) from a list of values,
/// appended in order.
///
/// ```
/// use augtree::seqlist;
/// let s = seqlist!["a", "b", "c"];
/// assert_eq!(s.iter().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
/// ```
#[macro_export]
macro_rules! seqlist {
    () => {
        $crate::SequenceList::new()
    };
    ($($val:expr),+ $(,)?) => {{
        let mut list = $crate::SequenceList::new();
        $(list.push_back($val);)+
        list
    }};
}

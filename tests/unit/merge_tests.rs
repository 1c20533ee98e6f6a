//! Column merge properties
//!
//! Merging is checked over every combination of the constraint flags on both
//! sides, plus random provenance sets.

use proptest::prelude::*;
use rust_relschema::database::{merge_columns, Column, ColumnDataType};
use rust_relschema::model::PropertyId;

#[derive(Debug, Clone, Copy)]
struct Flags {
    primary_key: bool,
    alternate_key: bool,
    unique: bool,
    nullable: bool,
    from_reference: bool,
}

fn flags() -> impl Strategy<Value = Flags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(primary_key, alternate_key, unique, nullable, from_reference)| Flags {
            primary_key,
            alternate_key,
            unique,
            nullable,
            from_reference,
        },
    )
}

fn sources() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::btree_set(0usize..32, 0..6).prop_map(|s| s.into_iter().collect())
}

fn contexts() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[A-D][a-z]{0,3}", 1..4).prop_map(|s| s.into_iter().collect())
}

fn column(flags: Flags, sources: &[usize], contexts: &[String]) -> Column {
    let mut c = Column::new("SchoolId", ColumnDataType::Integer);
    c.is_part_of_primary_key = flags.primary_key;
    c.is_part_of_alternate_key = flags.alternate_key;
    c.is_unique_index = flags.unique;
    c.is_nullable = flags.nullable;
    c.is_from_reference_property = flags.from_reference;
    c.source_properties = sources.iter().copied().map(PropertyId).collect();
    c.reference_context = contexts[0].clone();
    c.merged_reference_contexts = contexts.to_vec();
    c
}

proptest! {
    #[test]
    fn merge_takes_the_stronger_constraint(
        a in flags(), b in flags(),
        sa in sources(), sb in sources(),
        ca in contexts(), cb in contexts(),
    ) {
        let merged = merge_columns(&column(a, &sa, &ca), &column(b, &sb, &cb));

        prop_assert_eq!(merged.is_part_of_primary_key, a.primary_key || b.primary_key);
        prop_assert_eq!(merged.is_part_of_alternate_key, a.alternate_key || b.alternate_key);
        prop_assert_eq!(merged.is_unique_index, a.unique || b.unique);
        prop_assert_eq!(merged.is_nullable, a.nullable && b.nullable);
        prop_assert_eq!(merged.is_from_reference_property, a.from_reference || b.from_reference);
    }

    #[test]
    fn merge_unions_provenance_keeping_existing_first(
        a in flags(), b in flags(),
        sa in sources(), sb in sources(),
        ca in contexts(), cb in contexts(),
    ) {
        let existing = column(a, &sa, &ca);
        let merged = merge_columns(&existing, &column(b, &sb, &cb));

        prop_assert_eq!(&merged.source_properties[..sa.len()], &existing.source_properties[..]);
        for s in sa.iter().chain(&sb) {
            prop_assert!(merged.source_properties.contains(&PropertyId(*s)));
        }
        let mut deduped = merged.source_properties.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), merged.source_properties.len());

        for c in ca.iter().chain(&cb) {
            prop_assert!(merged.merged_reference_contexts.contains(c));
        }
        prop_assert_eq!(&merged.reference_context, &existing.reference_context);
        prop_assert_eq!(&merged.name_components, &existing.name_components);
    }

    #[test]
    fn merge_is_idempotent(a in flags(), sa in sources(), ca in contexts()) {
        let c = column(a, &sa, &ca);
        prop_assert_eq!(merge_columns(&c, &c), c);
    }

    #[test]
    fn merging_the_same_column_twice_changes_nothing(
        a in flags(), b in flags(),
        sa in sources(), sb in sources(),
        ca in contexts(), cb in contexts(),
    ) {
        let incoming = column(b, &sb, &cb);
        let once = merge_columns(&column(a, &sa, &ca), &incoming);
        let twice = merge_columns(&once, &incoming);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn merge_flags_are_order_independent(a in flags(), b in flags()) {
        let ctx = vec!["School".to_string()];
        let ab = merge_columns(&column(a, &[], &ctx), &column(b, &[], &ctx));
        let ba = merge_columns(&column(b, &[], &ctx), &column(a, &[], &ctx));
        prop_assert_eq!(ab.is_part_of_primary_key, ba.is_part_of_primary_key);
        prop_assert_eq!(ab.is_nullable, ba.is_nullable);
        prop_assert_eq!(ab.is_unique_index, ba.is_unique_index);
    }
}

#[test]
fn test_every_flag_combination() {
    let all: Vec<Flags> = (0..32u8)
        .map(|bits| Flags {
            primary_key: bits & 1 != 0,
            alternate_key: bits & 2 != 0,
            unique: bits & 4 != 0,
            nullable: bits & 8 != 0,
            from_reference: bits & 16 != 0,
        })
        .collect();
    let ctx = vec!["School".to_string()];

    for a in &all {
        for b in &all {
            let merged = merge_columns(&column(*a, &[1], &ctx), &column(*b, &[2], &ctx));
            assert_eq!(merged.is_part_of_primary_key, a.primary_key || b.primary_key);
            assert_eq!(merged.is_nullable, a.nullable && b.nullable);
            assert_eq!(merged.source_properties, vec![PropertyId(1), PropertyId(2)]);
        }
    }
}

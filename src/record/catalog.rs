//! Record catalog: the closed set of record kinds and their fixed field
//! layouts, per access method.
//!
//! No entry is ever added or removed at runtime; the tables below are
//! versioned with the access method's on-disk format. The decoder takes
//! its minimum-length check from `FieldLayout::header_size`, so the
//! catalog and the decoder cannot drift apart.

use super::types::{AccessMethod, HierarchicalKind, OrderedKind, RecordKind};

/// One fixed-width header field: name and byte width, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as used in diagnostics
    pub name: &'static str,
    /// Width in bytes
    pub width: usize,
}

/// Describes a variable-length trailer: which header field(s) hold the
/// element count and how wide each element is. The trailer length is the
/// sum of the count fields times the element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerSpec {
    /// Header fields whose values sum to the element count
    pub count_fields: &'static [&'static str],
    /// Width of one trailer element in bytes
    pub element_width: usize,
}

/// Fixed layout of one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Kind name, identical to `describe::identify` output
    pub kind_name: &'static str,
    /// Header fields in declared order, no padding between them
    pub fields: &'static [FieldSpec],
    /// Variable-length trailer, if the kind has one
    pub trailer: Option<TrailerSpec>,
}

impl FieldLayout {
    /// Total size of the fixed header in bytes.
    pub fn header_size(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }
}

macro_rules! fields {
    ($($name:literal : $width:literal),* $(,)?) => {
        &[
            FieldSpec { name: "tablespace", width: 4 },
            FieldSpec { name: "database", width: 4 },
            FieldSpec { name: "relation", width: 4 },
            $(FieldSpec { name: $name, width: $width }),*
        ]
    };
}

const INSERT_FIELDS: &[FieldSpec] = fields!["target_block": 4, "target_offset": 2];

const SPLIT_FIELDS: &[FieldSpec] = fields![
    "left_sibling": 4,
    "right_sibling": 4,
    "next_right": 4,
    "level": 4,
    "first_right": 2,
    "moved_count": 2,
];

const SPLIT_TRAILER: Option<TrailerSpec> = Some(TrailerSpec {
    count_fields: &["moved_count"],
    element_width: 6,
});

const OFFSET_TRAILER: Option<TrailerSpec> = Some(TrailerSpec {
    count_fields: &["deleted_count"],
    element_width: 2,
});

const UNLINK_FIELDS: &[FieldSpec] = fields![
    "dead": 4,
    "left_sibling": 4,
    "right_sibling": 4,
    "removal_horizon": 4,
    "leaf": 4,
    "leaf_left": 4,
    "leaf_right": 4,
    "top_parent": 4,
];

const INSERT_LEAF_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "INSERT_LEAF",
    fields: INSERT_FIELDS,
    trailer: None,
};

const INSERT_UPPER_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "INSERT_UPPER",
    fields: INSERT_FIELDS,
    trailer: None,
};

const INSERT_META_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "INSERT_META",
    fields: INSERT_FIELDS,
    trailer: None,
};

const SPLIT_L_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "SPLIT_L",
    fields: SPLIT_FIELDS,
    trailer: SPLIT_TRAILER,
};

const SPLIT_R_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "SPLIT_R",
    fields: SPLIT_FIELDS,
    trailer: SPLIT_TRAILER,
};

const SPLIT_L_ROOT_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "SPLIT_L_ROOT",
    fields: SPLIT_FIELDS,
    trailer: SPLIT_TRAILER,
};

const SPLIT_R_ROOT_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "SPLIT_R_ROOT",
    fields: SPLIT_FIELDS,
    trailer: SPLIT_TRAILER,
};

const VACUUM_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "VACUUM",
    fields: fields!["block": 4, "last_vacuumed": 4, "deleted_count": 2],
    trailer: OFFSET_TRAILER,
};

const DELETE_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "DELETE",
    fields: fields![
        "block": 4,
        "heap_tablespace": 4,
        "heap_database": 4,
        "heap_relation": 4,
        "deleted_count": 2,
    ],
    trailer: OFFSET_TRAILER,
};

const HALF_DEAD_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "MARK_PAGE_HALFDEAD",
    fields: fields![
        "target_block": 4,
        "target_offset": 2,
        "top_parent": 4,
        "leaf": 4,
        "left": 4,
        "right": 4,
    ],
    trailer: None,
};

const UNLINK_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "UNLINK_PAGE",
    fields: UNLINK_FIELDS,
    trailer: None,
};

const UNLINK_META_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "UNLINK_PAGE_META",
    fields: UNLINK_FIELDS,
    trailer: None,
};

const NEW_ROOT_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "NEWROOT",
    fields: fields!["root": 4, "level": 4, "left_child": 4, "right_child": 4],
    trailer: None,
};

const REUSE_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "REUSE_PAGE",
    fields: fields!["block": 4, "removal_horizon": 4],
    trailer: None,
};

const PAGE_UPDATE_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "PAGE_UPDATE",
    fields: fields!["block": 4, "deleted_count": 2, "inserted_count": 2],
    trailer: Some(TrailerSpec {
        count_fields: &["deleted_count", "inserted_count"],
        element_width: 2,
    }),
};

const PAGE_SPLIT_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "PAGE_SPLIT",
    fields: fields!["origin": 4, "page_count": 2],
    trailer: Some(TrailerSpec {
        count_fields: &["page_count"],
        element_width: 4,
    }),
};

const CREATE_INDEX_LAYOUT: FieldLayout = FieldLayout {
    kind_name: "CREATE_INDEX",
    fields: fields![],
    trailer: None,
};

/// Layout of a resolved kind. Total over `RecordKind`.
pub fn layout_of(kind: RecordKind) -> &'static FieldLayout {
    match kind {
        RecordKind::Ordered(k) => match k {
            OrderedKind::InsertLeaf => &INSERT_LEAF_LAYOUT,
            OrderedKind::InsertUpper => &INSERT_UPPER_LAYOUT,
            OrderedKind::InsertMeta => &INSERT_META_LAYOUT,
            OrderedKind::SplitLeft => &SPLIT_L_LAYOUT,
            OrderedKind::SplitRight => &SPLIT_R_LAYOUT,
            OrderedKind::SplitLeftRoot => &SPLIT_L_ROOT_LAYOUT,
            OrderedKind::SplitRightRoot => &SPLIT_R_ROOT_LAYOUT,
            OrderedKind::VacuumPage => &VACUUM_LAYOUT,
            OrderedKind::DeleteEntries => &DELETE_LAYOUT,
            OrderedKind::MarkPageHalfDead => &HALF_DEAD_LAYOUT,
            OrderedKind::UnlinkPage => &UNLINK_LAYOUT,
            OrderedKind::UnlinkPageMeta => &UNLINK_META_LAYOUT,
            OrderedKind::NewRoot => &NEW_ROOT_LAYOUT,
            OrderedKind::ReusePage => &REUSE_LAYOUT,
        },
        RecordKind::Hierarchical(k) => match k {
            HierarchicalKind::UpdatePage => &PAGE_UPDATE_LAYOUT,
            HierarchicalKind::SplitPage => &PAGE_SPLIT_LAYOUT,
            HierarchicalKind::CreateIndex => &CREATE_INDEX_LAYOUT,
        },
    }
}

/// Layout lookup from raw tags: `None` is the unknown-kind case.
pub fn schema_for(method: AccessMethod, kind_tag: u8) -> Option<&'static FieldLayout> {
    RecordKind::resolve(method, kind_tag).map(layout_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ordered_kind_has_a_layout() {
        for kind in OrderedKind::ALL {
            let layout = layout_of(RecordKind::Ordered(kind));
            // Every layout starts with the 12-byte relation locator.
            assert!(layout.header_size() >= 12, "{}", layout.kind_name);
        }
    }

    #[test]
    fn test_every_hierarchical_kind_has_a_layout() {
        for kind in HierarchicalKind::ALL {
            let layout = layout_of(RecordKind::Hierarchical(kind));
            assert!(layout.header_size() >= 12, "{}", layout.kind_name);
        }
    }

    #[test]
    fn test_schema_for_unknown_kind_is_none() {
        assert!(schema_for(AccessMethod::Ordered, 14).is_none());
        assert!(schema_for(AccessMethod::Hierarchical, 3).is_none());
        assert!(schema_for(AccessMethod::Hierarchical, 255).is_none());
    }

    #[test]
    fn test_header_sizes() {
        assert_eq!(schema_for(AccessMethod::Ordered, 0).unwrap().header_size(), 18);
        assert_eq!(schema_for(AccessMethod::Ordered, 3).unwrap().header_size(), 32);
        assert_eq!(schema_for(AccessMethod::Ordered, 7).unwrap().header_size(), 22);
        assert_eq!(schema_for(AccessMethod::Ordered, 8).unwrap().header_size(), 30);
        assert_eq!(schema_for(AccessMethod::Ordered, 9).unwrap().header_size(), 34);
        assert_eq!(schema_for(AccessMethod::Ordered, 10).unwrap().header_size(), 44);
        assert_eq!(schema_for(AccessMethod::Ordered, 12).unwrap().header_size(), 28);
        assert_eq!(schema_for(AccessMethod::Ordered, 13).unwrap().header_size(), 20);
        assert_eq!(schema_for(AccessMethod::Hierarchical, 0).unwrap().header_size(), 20);
        assert_eq!(schema_for(AccessMethod::Hierarchical, 1).unwrap().header_size(), 18);
        assert_eq!(schema_for(AccessMethod::Hierarchical, 2).unwrap().header_size(), 12);
    }

    #[test]
    fn test_split_variants_share_one_layout() {
        let base = schema_for(AccessMethod::Ordered, 3).unwrap();
        for tag in [4u8, 5, 6] {
            let variant = schema_for(AccessMethod::Ordered, tag).unwrap();
            assert_eq!(variant.fields, base.fields);
            assert_eq!(variant.trailer, base.trailer);
            assert_ne!(variant.kind_name, base.kind_name);
        }
    }

    #[test]
    fn test_trailer_specs() {
        let split = schema_for(AccessMethod::Ordered, 3).unwrap();
        let trailer = split.trailer.unwrap();
        assert_eq!(trailer.count_fields, &["moved_count"]);
        assert_eq!(trailer.element_width, 6);

        let update = schema_for(AccessMethod::Hierarchical, 0).unwrap();
        let trailer = update.trailer.unwrap();
        assert_eq!(trailer.count_fields.len(), 2);
        assert_eq!(trailer.element_width, 2);
    }
}

use genrepo_core::{
    open_db_in_memory, CrudRepository, DbOptions, Entry, EntryRecord, FilterMode, Model,
    Predicate, PredicateError, RepoError, UnitOfWork,
};
use proptest::prelude::*;
use time::{Date, Month};

type EntryPredicate = Predicate<EntryRecord>;

const DESCRIPTIONS: [&str; 4] = ["a", "b", "c", "it's"];

fn day(day: u8) -> Date {
    Date::from_calendar_date(2024, Month::January, day).unwrap()
}

fn dataset() -> Vec<EntryRecord> {
    (1..=8)
        .map(|id| EntryRecord {
            id,
            description: match id % 5 {
                0 => None,
                n => Some(DESCRIPTIONS[usize::try_from(n - 1).unwrap()].to_string()),
            },
            date: day(u8::try_from(id * 3).unwrap()),
        })
        .collect()
}

fn arb_id_predicate() -> impl Strategy<Value = EntryPredicate> {
    (0i64..10, 0u8..4).prop_map(|(id, op)| match op {
        0 => EntryRecord::ID.eq(id),
        1 => EntryRecord::ID.ne(id),
        2 => EntryRecord::ID.lt(id),
        _ => EntryRecord::ID.gt(id),
    })
}

fn arb_description_predicate() -> impl Strategy<Value = EntryPredicate> {
    (prop::sample::select(DESCRIPTIONS.to_vec()), 0u8..6).prop_map(|(text, op)| match op {
        0 => EntryRecord::DESCRIPTION.eq(text),
        1 => EntryRecord::DESCRIPTION.ne(text),
        2 => EntryRecord::DESCRIPTION.lt(text),
        3 => EntryRecord::DESCRIPTION.gt(text),
        4 => EntryRecord::DESCRIPTION.is_null(),
        _ => EntryRecord::DESCRIPTION.is_not_null(),
    })
}

fn arb_date_predicate() -> impl Strategy<Value = EntryPredicate> {
    (1u8..=28, 0u8..4).prop_map(|(d, op)| match op {
        0 => EntryRecord::DATE.eq(day(d)),
        1 => EntryRecord::DATE.ne(day(d)),
        2 => EntryRecord::DATE.lt(day(d)),
        _ => EntryRecord::DATE.gt(day(d)),
    })
}

fn arb_real_id_predicate() -> impl Strategy<Value = EntryPredicate> {
    (0i32..10, any::<bool>()).prop_map(|(id, below)| {
        let bound = f64::from(id) + 0.5;
        if below {
            EntryRecord::ID.lt(bound)
        } else {
            EntryRecord::ID.gt(bound)
        }
    })
}

// Literals whose kind does not fit the column they are compared against.
fn arb_mismatched_predicate() -> impl Strategy<Value = EntryPredicate> {
    (1u8..=8, 0u8..4).prop_map(|(n, op)| match op {
        0 => EntryRecord::ID.eq(n.to_string()),
        1 => EntryRecord::DESCRIPTION.eq(i64::from(n)),
        2 => EntryRecord::DATE.lt(i64::from(n)),
        _ => EntryRecord::DESCRIPTION.gt(day(n)),
    })
}

fn arb_predicate() -> impl Strategy<Value = EntryPredicate> {
    let leaf = prop_oneof![
        4 => arb_id_predicate(),
        2 => arb_real_id_predicate(),
        4 => arb_description_predicate(),
        4 => arb_date_predicate(),
        1 => arb_mismatched_predicate(),
    ];

    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(left, right)| left.and(right)),
            (inner.clone(), inner).prop_map(|(left, right)| left.or(right)),
        ]
    })
}

fn seeded(mode: FilterMode) -> UnitOfWork {
    let options = DbOptions {
        filter_mode: mode,
        ..DbOptions::default()
    };
    let conn = open_db_in_memory(&options).unwrap();
    conn.execute_batch(EntryRecord::CREATE_TABLE_SQL).unwrap();

    let mut uow = UnitOfWork::begin(conn, &options).unwrap();
    let mut repo = uow.repository::<Entry>();
    for record in dataset() {
        repo.create(&Entry::from_record(record)).unwrap();
    }
    uow
}

fn native_ids(predicate: &EntryPredicate) -> Result<Vec<i64>, PredicateError> {
    let mut ids = Vec::new();
    for record in dataset() {
        if predicate.matches(&record)? {
            ids.push(record.id);
        }
    }
    Ok(ids)
}

fn sql_ids(mode: FilterMode, predicate: &EntryPredicate) -> Result<Vec<i64>, PredicateError> {
    let mut uow = seeded(mode);
    let entries = match uow.repository::<Entry>().get_all(Some(predicate)) {
        Ok(entries) => entries,
        Err(RepoError::UnsupportedPredicate(err)) => return Err(err),
        Err(other) => panic!("unexpected repository error: {other}"),
    };
    let mut ids = entries.into_iter().map(|entry| entry.id).collect::<Vec<_>>();
    ids.sort_unstable();
    Ok(ids)
}

proptest! {
    #[test]
    fn bound_filters_select_the_natively_matching_rows(predicate in arb_predicate()) {
        prop_assert_eq!(sql_ids(FilterMode::Bound, &predicate), native_ids(&predicate));
    }

    #[test]
    fn inline_filters_select_the_natively_matching_rows(predicate in arb_predicate()) {
        prop_assert_eq!(sql_ids(FilterMode::Inline, &predicate), native_ids(&predicate));
    }

    #[test]
    fn mismatched_literals_fail_on_both_paths(predicate in arb_mismatched_predicate()) {
        let expected = Err(PredicateError::Unsupported {
            kind: "literal type does not match column",
        });
        prop_assert_eq!(native_ids(&predicate), expected.clone());
        prop_assert_eq!(sql_ids(FilterMode::Bound, &predicate), expected.clone());
        prop_assert_eq!(sql_ids(FilterMode::Inline, &predicate), expected);
    }
}

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};

use docbucket::{key::sequence_key, prelude::*};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
struct Fruit {
    #[document(key)]
    #[serde(rename = "_id", default)]
    id: String,
    name: String,
    #[serde(default)]
    price: i64,
}

impl Fruit {
    fn new(name: &str) -> Self {
        Self { id: String::new(), name: name.to_string(), price: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Document)]
struct Crate {
    #[document(key)]
    #[serde(flatten)]
    identity: Identity,
    #[serde(rename = "contents")]
    fruits: Vec<String>,
    #[serde(skip)]
    scratch: u8,
}

const FRUITS: [&str; 15] = [
    "Apple", "Peach", "Banana", "Pear", "Cherry", "Plum", "Date", "Papaya", "Elderberry", "Fig", "Pineapple",
    "Grape", "Kiwi", "Lemon", "Mango",
];

fn names(fruits: &[Fruit]) -> Vec<&str> {
    fruits.iter().map(|f| f.name.as_str()).collect()
}

fn open(names: &[&str]) -> (Driver, Collection<Fruit>) {
    let driver = Driver::in_memory().unwrap();
    let fruits = driver.collection::<Fruit>("fruits").unwrap();
    fruits.insert_many(names.iter().map(|name| Fruit::new(name))).unwrap();
    (driver, fruits)
}

#[test]
fn insert_find_update_delete() {
    let (_driver, fruits) = open(&[]);

    let key = fruits.insert(Fruit::new("Apple")).unwrap();
    let mut apple = fruits.find_by_key(&key).unwrap();
    assert_eq!(apple.id.as_bytes(), key.as_slice());
    assert_eq!(apple.name, "Apple");

    apple.price = 3;
    fruits.update_one(apple.clone()).unwrap();
    assert_eq!(fruits.find_by_key(&key).unwrap().price, 3);

    fruits.delete_one(apple).unwrap();
    assert!(fruits.find_by_key(&key).unwrap_err().is_not_found());
    assert_eq!(fruits.count().unwrap(), 0);
}

#[test]
fn update_of_unknown_key_creates_the_record() {
    let (_driver, fruits) = open(&["Apple"]);
    let mut kiwi = Fruit::new("Kiwi");
    kiwi.id = "kiwi".to_string();
    fruits.update_one(kiwi.clone()).unwrap();
    assert_eq!(fruits.find_by_key("kiwi").unwrap(), kiwi);
}

#[test]
fn delete_of_unknown_key_is_silent() {
    let (_driver, fruits) = open(&["Apple"]);
    let mut ghost = Fruit::new("Ghost");
    ghost.id = "ghost".to_string();
    fruits.delete_one(ghost).unwrap();
    assert_eq!(fruits.count().unwrap(), 1);
}

#[test]
fn predicate_page_reports_visited_records() {
    let (_driver, fruits) = open(&["Apple", "Banana", "Cherry", "Pineapple"]);

    let result = fruits.query(Query::filter(|f: &Fruit| f.name.starts_with('P')));
    assert_eq!(names(result.items()), vec!["Pineapple"]);
    assert_eq!(result.next(), 4);

    let page = fruits
        .query(Query::builder().filter(|_: &Fruit| true).skip(1).count(1).build())
        .page();
    assert_eq!(page.count, 1);
    assert_eq!(page.result[0].name, "Cherry");
    assert_eq!(page.next, 2);
}

#[test]
fn paging_walks_every_record_once() {
    let (_driver, fruits) = open(&FRUITS);

    let mut seen = Vec::new();
    let mut skip = 0;
    loop {
        let page = fruits
            .query(Query::builder().filter(|f: &Fruit| f.name.contains('a')).skip(skip).count(4).build())
            .page();
        if page.is_empty() {
            break;
        }
        seen.extend(page.result.into_iter().map(|f| f.name));
        skip = page.next;
    }

    let expected: Vec<String> = FRUITS.iter().rev().filter(|n| n.contains('a')).map(|n| n.to_string()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn find_honours_options() {
    let (_driver, fruits) = open(&["Apple", "Banana", "Cherry", "Pineapple"]);

    let newest_two = fruits.find(|_| true, FindOptions::new().count(2)).unwrap();
    assert_eq!(names(&newest_two), vec!["Pineapple", "Cherry"]);

    let (rest, keys) = fruits.find_with_keys(|_| true, FindOptions::new().skip(2)).unwrap();
    assert_eq!(names(&rest), vec!["Banana", "Apple"]);
    assert_eq!(keys, vec![sequence_key(2), sequence_key(1)]);

    assert!(fruits.find(|f| f.name == "Durian", FindOptions::new()).unwrap_err().is_not_found());
}

#[test]
fn find_one_returns_newest_match() {
    let (_driver, fruits) = open(&["Pear", "Apple", "Plum"]);
    let (plum, key) = fruits.find_one_with_key(|f| f.name.starts_with('P')).unwrap();
    assert_eq!(plum.name, "Plum");
    assert_eq!(key, sequence_key(3));
}

#[test]
fn delete_iter_removes_matching_records() {
    let (_driver, fruits) = open(&FRUITS);
    assert_eq!(FRUITS.iter().filter(|n| n.starts_with('P')).count(), 5);

    let deleted = fruits.delete_iter(|f| f.name.starts_with('P')).unwrap();
    assert_eq!(deleted, 5);
    assert_eq!(fruits.count().unwrap(), 10);
    assert!(fruits.find(|f| f.name.starts_with('P'), FindOptions::new()).is_err());
}

#[test]
fn query_results_chain_into_mutations() {
    let (_driver, fruits) = open(&FRUITS);

    let updated = fruits
        .query(Query::filter(|f: &Fruit| f.name.len() <= 4))
        .filter(|f| f.name != "Plum")
        .iterate(|f| {
            f.price = 1;
            Ok(())
        })
        .update()
        .unwrap();
    assert_eq!(updated, 4);

    let cheap = fruits.find(|f| f.price == 1, FindOptions::new()).unwrap();
    assert_eq!(names(&cheap), vec!["Kiwi", "Fig", "Date", "Pear"]);

    let deleted = fruits.query(Query::filter(|f: &Fruit| f.price == 1)).delete().unwrap();
    assert_eq!(deleted, 4);
    assert_eq!(fruits.count().unwrap(), 11);
}

#[test]
fn chain_stops_at_first_error() {
    let (_driver, fruits) = open(&["Apple", "Banana"]);
    let visited = AtomicUsize::new(0);

    let result = fruits
        .query(Query::filter(|_: &Fruit| true))
        .validate(|result| {
            if result.count() > 1 {
                Err(DocumentStoreError::InvalidQuery("too many fruits".into()))
            } else {
                Ok(())
            }
        })
        .iterate(|_| {
            visited.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert!(matches!(result.error(), Some(DocumentStoreError::InvalidQuery(_))));
    assert_eq!(visited.load(Ordering::SeqCst), 0);
    assert!(result.delete().is_err());
    assert_eq!(fruits.count().unwrap(), 2);
}

#[test]
fn key_queries_skip_missing_keys() {
    let (_driver, fruits) = open(&["Apple", "Banana", "Cherry"]);
    let result = fruits.query(Query::keys([sequence_key(2), sequence_key(9), sequence_key(1)]));
    assert_eq!(names(result.items()), vec!["Banana", "Apple"]);
    assert_eq!(result.keys(), &[sequence_key(2), sequence_key(1)]);
    assert_eq!(fruits.find_by_keys([sequence_key(9)]).unwrap(), Vec::<Fruit>::new());
}

#[test]
fn update_and_delete_hooks_wrap_writes() {
    let (_driver, mut fruits) = open(&["Apple", "Banana"]);
    let deletes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&deletes);

    fruits
        .before_update(|f: &mut Fruit| {
            f.name = format!("{} (ripe)", f.name);
            Ok(())
        })
        .before_delete(|f: &mut Fruit| {
            if f.name.starts_with("Banana") {
                Err(DocumentStoreError::hook("bananas stay"))
            } else {
                Ok(())
            }
        })
        .after_delete(move |_: &mut Fruit| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let updated = fruits.update_iter(Some).unwrap();
    assert_eq!(updated, 2);
    let all = fruits.find(|_| true, FindOptions::new()).unwrap();
    assert_eq!(names(&all), vec!["Banana (ripe)", "Apple (ripe)"]);

    let err = fruits.delete_many(all).unwrap_err();
    assert!(matches!(err, DocumentStoreError::Hook(_)));
    assert_eq!(fruits.count().unwrap(), 2);
    assert_eq!(deletes.load(Ordering::SeqCst), 0);

    let deleted = fruits.delete_iter(|f| f.name.starts_with("Apple")).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(deletes.load(Ordering::SeqCst), 1);
}

#[test]
fn uuid_keys_replace_sequences() {
    let driver = Driver::in_memory().unwrap();
    let mut fruits = driver.collection::<Fruit>("fruits").unwrap();
    fruits.key_generator(UuidKeys);

    let key = fruits.insert(Fruit::new("Apple")).unwrap();
    let text = String::from_utf8(key.clone()).unwrap();
    assert!(uuid::Uuid::parse_str(&text).is_ok());
    assert_eq!(fruits.find_by_key(&key).unwrap().id, text);
}

#[test]
fn derived_schema_uses_serialized_names() {
    assert_eq!(
        Fruit::schema(),
        Schema::default().with_field("id", "_id").with_field("name", "name").with_field("price", "price")
    );
    assert_eq!(Crate::schema(), Schema::new(vec![FieldAlias::new("fruits", "contents")]));

    let driver = Driver::in_memory().unwrap();
    driver.collection::<Fruit>("fruits").unwrap();
    let fields = driver.fields_of("fruits").unwrap();
    assert_eq!(fields[0], FieldAlias::new("id", "_id"));
    assert_eq!(fields.len(), 3);
}

#[test]
fn identity_key_field_is_flattened() {
    let driver = Driver::in_memory().unwrap();
    let crates = driver.collection::<Crate>("crates").unwrap();

    let key = crates
        .insert(Crate { identity: Identity::default(), fruits: vec!["Apple".into()], scratch: 7 })
        .unwrap();
    let stored = crates.find_by_key(&key).unwrap();
    assert_eq!(stored.identity.id.as_bytes(), key.as_slice());
    assert_eq!(stored.fruits, vec!["Apple"]);
    assert_eq!(stored.scratch, 0);

    let raw = serde_json::to_value(&stored).unwrap();
    assert_eq!(raw["_id"], serde_json::Value::String(stored.identity.id.clone()));
}

use mongodb::bson::{doc, Document};
use product_service::models::NewProduct;
use product_service::services::{
    seed_database, seed_products, MockProductStore, ProductStore, SeedOutcome,
};

#[tokio::test]
async fn seeding_empty_collection_inserts_fixed_set() {
    let store = MockProductStore::new();

    assert_eq!(seed_database(&store).await, SeedOutcome::Seeded(3));

    let products = store.find_all().await.unwrap().unwrap();
    let stored: Vec<Document> = products.iter().map(|p| p.fields().clone()).collect();

    assert_eq!(
        stored,
        vec![
            doc! { "name": "Product 1", "price": 10.0, "imageUrl": "images/product1.jpg" },
            doc! { "name": "Product 2", "price": 20.0, "imageUrl": "images/product2.jpg" },
            doc! { "name": "Product 3", "price": 30.0, "imageUrl": "images/product3.jpg" },
        ]
    );
    let expected: Vec<Document> = seed_products().iter().map(NewProduct::to_document).collect();
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn seeding_populated_collection_twice_is_a_no_op() {
    let store = MockProductStore::with_products(vec![NewProduct::new("Existing", 1.0)]);

    assert_eq!(seed_database(&store).await, SeedOutcome::AlreadyPopulated);
    let after_first = store.count();
    assert_eq!(seed_database(&store).await, SeedOutcome::AlreadyPopulated);

    assert_eq!(after_first, 1);
    assert_eq!(store.count(), after_first);
}

#[tokio::test]
async fn second_run_after_seeding_inserts_nothing() {
    let store = MockProductStore::new();

    assert_eq!(seed_database(&store).await, SeedOutcome::Seeded(3));
    assert_eq!(seed_database(&store).await, SeedOutcome::AlreadyPopulated);
    assert_eq!(store.count(), 3);
}

#[tokio::test]
async fn seeders_that_both_observe_empty_insert_each_record_once() {
    let store = MockProductStore::new();

    let (first, second) = tokio::join!(seed_database(&store), seed_database(&store));

    // Both passed the emptiness check; only the keyed insert kept them apart.
    assert!(matches!(first, SeedOutcome::Seeded(_)));
    assert!(matches!(second, SeedOutcome::Seeded(_)));
    let inserted: u64 = [first, second]
        .iter()
        .map(|outcome| match outcome {
            SeedOutcome::Seeded(n) => *n,
            _ => 0,
        })
        .sum();
    assert_eq!(inserted, 3);
    assert_eq!(store.count(), 3);
}

#[tokio::test]
async fn store_failure_is_swallowed() {
    let store = MockProductStore::new();
    store.set_fail_queries(true);

    assert_eq!(seed_database(&store).await, SeedOutcome::Failed);

    store.set_fail_queries(false);
    assert_eq!(store.count(), 0);
}

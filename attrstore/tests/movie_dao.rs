/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! End-to-end CRUD against the in-memory store, with an entity that uses
//! every storable field shape at once: scalars on both key slots, epoch
//! timestamps, a nested record list and all three map flavors.

use std::collections::HashMap;

use attrstore::{
    AttributeValue, Dao, DaoErrorKind, Entity, FieldDef, FieldType, KeyAttributeType, MemoryStore,
    TableSchema, UpdateExpression,
};
use serde_json::json;

#[derive(Clone, Debug, Default, PartialEq)]
struct Movie {
    year: Option<i32>,
    title: Option<String>,
    created_on: Option<i64>,
    last_updated_on: Option<i64>,
    reviews: Vec<Review>,
    info: HashMap<String, serde_json::Value>,
    prim_info: HashMap<String, String>,
    obj_info: HashMap<String, Info>,
}

impl Entity for Movie {
    fn entity_name() -> &'static str {
        "Movie"
    }

    fn table_name() -> &'static str {
        "movies"
    }

    // Attribute names follow the existing table, not the struct fields.
    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::new(
                "yr",
                FieldType::scalar::<i32>(),
                |m: &Movie| m.year.as_ref(),
                |m: &mut Movie, v| m.year = v,
            )
            .hash_key(),
            FieldDef::new(
                "title",
                FieldType::scalar::<String>(),
                |m: &Movie| m.title.as_ref(),
                |m: &mut Movie, v| m.title = v,
            )
            .range_key(),
            FieldDef::new(
                "createdOn",
                FieldType::scalar::<i64>(),
                |m: &Movie| m.created_on.as_ref(),
                |m: &mut Movie, v| m.created_on = v,
            ),
            FieldDef::new(
                "lastUpdatedOn",
                FieldType::scalar::<i64>(),
                |m: &Movie| m.last_updated_on.as_ref(),
                |m: &mut Movie, v| m.last_updated_on = v,
            ),
            FieldDef::new(
                "reviews",
                FieldType::record_list::<Review>(),
                |m: &Movie| Some(&m.reviews),
                |m: &mut Movie, v| m.reviews = v.unwrap_or_default(),
            ),
            FieldDef::new(
                "info",
                FieldType::scalar_map::<String, serde_json::Value>(),
                |m: &Movie| Some(&m.info),
                |m: &mut Movie, v| m.info = v.unwrap_or_default(),
            ),
            FieldDef::new(
                "primInfo",
                FieldType::scalar_map::<String, String>(),
                |m: &Movie| Some(&m.prim_info),
                |m: &mut Movie, v| m.prim_info = v.unwrap_or_default(),
            ),
            FieldDef::new(
                "objInfo",
                FieldType::record_map::<Info>(),
                |m: &Movie| Some(&m.obj_info),
                |m: &mut Movie, v| m.obj_info = v.unwrap_or_default(),
            ),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Review {
    id: Option<String>,
    reviewer: Option<String>,
    comments: Option<String>,
    rating: Option<f32>,
}

impl Entity for Review {
    fn entity_name() -> &'static str {
        "Review"
    }

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::new(
                "id",
                FieldType::scalar::<String>(),
                |r: &Review| r.id.as_ref(),
                |r: &mut Review, v| r.id = v,
            )
            .hash_key(),
            FieldDef::new(
                "reviewer",
                FieldType::scalar::<String>(),
                |r: &Review| r.reviewer.as_ref(),
                |r: &mut Review, v| r.reviewer = v,
            ),
            FieldDef::new(
                "comments",
                FieldType::scalar::<String>(),
                |r: &Review| r.comments.as_ref(),
                |r: &mut Review, v| r.comments = v,
            ),
            FieldDef::new(
                "rating",
                FieldType::scalar::<f32>(),
                |r: &Review| r.rating.as_ref(),
                |r: &mut Review, v| r.rating = v,
            ),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Info {
    reviewer: Option<String>,
    comments: Option<String>,
}

impl Entity for Info {
    fn entity_name() -> &'static str {
        "Info"
    }

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::new(
                "reviewer",
                FieldType::scalar::<String>(),
                |i: &Info| i.reviewer.as_ref(),
                |i: &mut Info, v| i.reviewer = v,
            )
            .hash_key(),
            FieldDef::new(
                "comments",
                FieldType::scalar::<String>(),
                |i: &Info| i.comments.as_ref(),
                |i: &mut Info, v| i.comments = v,
            ),
        ]
    }
}

fn review(id: &str, rating: f32, comment: &str) -> Review {
    Review {
        id: Some(id.to_string()),
        reviewer: Some("SomeReviewer".to_string()),
        comments: Some(comment.to_string()),
        rating: Some(rating),
    }
}

fn info(i: u32) -> Info {
    Info {
        reviewer: Some(format!("Some Reviewer {}", i)),
        comments: Some(format!("Info Comments {}", i)),
    }
}

fn big_hit_movie() -> Movie {
    Movie {
        year: Some(1990),
        title: Some("Big Hit Movie".to_string()),
        created_on: Some(1_445_412_480_000),
        last_updated_on: Some(1_445_412_480_000),
        reviews: vec![
            review("r-1", 3.8, "Comment 1"),
            review("r-2", 3.9, "Comment 2"),
        ],
        info: HashMap::from([
            ("source".to_string(), json!("imdb")),
            ("scores".to_string(), json!([6.5, 7.0])),
        ]),
        prim_info: HashMap::from([
            ("mapPrimInfoKey1".to_string(), "mapInfoValue1".to_string()),
            ("mapPrimInfoKey2".to_string(), "mapInfoValue2".to_string()),
        ]),
        obj_info: HashMap::from([
            ("mapObjInfoKey1".to_string(), info(1)),
            ("mapObjInfoKey2".to_string(), info(2)),
        ]),
    }
}

fn key_of(movie: &Movie) -> Movie {
    Movie {
        year: movie.year,
        title: movie.title.clone(),
        ..Movie::default()
    }
}

async fn dao_with_table() -> Dao<Movie, MemoryStore> {
    let dao = Dao::<Movie, _>::new(MemoryStore::new()).unwrap();
    dao.create_table(dao.table_schema().unwrap()).await.unwrap();
    dao
}

#[tokio::test]
async fn creating_the_table_twice_reports_the_conflict() {
    let dao = Dao::<Movie, _>::new(MemoryStore::new()).unwrap();
    let schema = TableSchema::hash("yr", KeyAttributeType::N)
        .and_range("title", KeyAttributeType::S)
        .capacity(5, 5);
    assert_eq!(dao.table_schema().unwrap(), schema);

    dao.create_table(schema.clone()).await.unwrap();
    let err = dao.create_table(schema).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::TableExists));
    assert_eq!(err.table(), "movies");
}

#[tokio::test]
async fn records_roundtrip_with_every_field_shape() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();
    dao.insert(&movie).await.unwrap();

    let stored = dao.get(&key_of(&movie)).await.unwrap();
    assert_eq!(stored, movie);
}

#[tokio::test]
async fn delete_removes_the_record_under_the_composite_key() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();
    dao.insert(&movie).await.unwrap();

    let removed = dao.delete(&key_of(&movie)).await.unwrap();
    assert_eq!(removed, movie);

    let err = dao.get(&key_of(&movie)).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::ItemDoesNotExist));

    let err = dao.delete(&key_of(&movie)).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::CouldNotDelete));
}

#[tokio::test]
async fn double_insert_is_rejected_and_changes_nothing() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();
    dao.insert(&movie).await.unwrap();

    let mut altered = movie.clone();
    altered.last_updated_on = Some(9_999_999_999_999);
    let err = dao.insert(&altered).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::CouldNotInsert));

    assert_eq!(dao.get(&key_of(&movie)).await.unwrap(), movie);
}

#[tokio::test]
async fn replace_swaps_the_record_and_returns_the_old_one() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();
    dao.insert(&movie).await.unwrap();

    let mut newer = movie.clone();
    newer.last_updated_on = Some(1_445_412_481_000);
    newer.reviews.push(review("r-3", 4.1, "Comment 3"));

    let previous = dao.replace(&newer).await.unwrap();
    assert_eq!(previous, movie);
    assert_eq!(dao.get(&key_of(&movie)).await.unwrap(), newer);
}

#[tokio::test]
async fn replace_requires_an_existing_item() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();

    let err = dao.replace(&movie).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::CouldNotInsert));

    let err = dao.get(&key_of(&movie)).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::ItemDoesNotExist));
}

#[tokio::test]
async fn update_returns_the_record_as_written() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();
    dao.insert(&movie).await.unwrap();

    let updated = dao
        .update(
            &key_of(&movie),
            UpdateExpression::new("SET lastUpdatedOn = :ts")
                .value(":ts", AttributeValue::N("1500000000000".to_string())),
        )
        .await
        .unwrap();

    let mut expected = movie.clone();
    expected.last_updated_on = Some(1_500_000_000_000);
    assert_eq!(updated, expected);
    assert_eq!(dao.get(&key_of(&movie)).await.unwrap(), expected);
}

#[tokio::test]
async fn update_never_creates_an_item() {
    let dao = dao_with_table().await;
    let movie = big_hit_movie();

    let err = dao
        .update(
            &key_of(&movie),
            UpdateExpression::new("SET lastUpdatedOn = :ts")
                .value(":ts", AttributeValue::N("0".to_string())),
        )
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::CouldNotUpdate));

    let err = dao.get(&key_of(&movie)).await.unwrap_err();
    assert!(matches!(err.kind(), DaoErrorKind::ItemDoesNotExist));
}

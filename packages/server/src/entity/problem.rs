use common::Difficulty;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "problem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String, // in Markdown
    pub difficulty: Difficulty,

    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: serde_json::Value,
    /// JSON array of `{input, output, explanation?}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub examples: serde_json::Value,
    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub constraints: serde_json::Value,
    /// JSON array of `{language, code}`, in declaration order.
    #[sea_orm(column_type = "JsonBinary")]
    pub code_snippets: serde_json::Value,
    /// JSON array of `{language, code}`, in declaration order.
    #[sea_orm(column_type = "JsonBinary")]
    pub reference_solutions: serde_json::Value,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub test_cases: HasMany<super::test_case::Entity>,

    /// Last time the reference solutions passed every test case.
    pub validated_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{
    error::SdkError,
    operation::{
        batch_write_item::{BatchWriteItemError, BatchWriteItemOutput},
        delete_item::{DeleteItemError, DeleteItemOutput},
        get_item::{GetItemError, GetItemOutput},
        put_item::{PutItemError, PutItemOutput},
        query::{QueryError, QueryOutput},
        scan::{ScanError, ScanOutput},
        update_item::{UpdateItemError, UpdateItemOutput},
    },
    types::{PutRequest, ReturnValue, WriteRequest},
};
use fractic_core::collection;
use mockall::automock;
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;

use super::{DynamoMap, ReviewStore, StoreTables};

// Underlying backend, which performs the actual AWS operations. Kept generic so
// that it can be swapped with a mock backend for testing.
//
// Should be kept as minimal and close as possible to the real
// aws_sdk_dynamodb::Client, to minimize untestable code.
#[automock]
#[async_trait]
pub trait DynamoBackend: Send + Sync {
    async fn query(
        &self,
        table_name: String,
        index: Option<String>,
        key_condition: String,
        attribute_values: DynamoMap,
    ) -> Result<QueryOutput, SdkError<QueryError>>;

    async fn scan(
        &self,
        table_name: String,
        index: Option<String>,
        filter_expression: Option<String>,
        attribute_values: Option<DynamoMap>,
    ) -> Result<ScanOutput, SdkError<ScanError>>;

    async fn get_item(
        &self,
        table_name: String,
        key: DynamoMap,
    ) -> Result<GetItemOutput, SdkError<GetItemError>>;

    async fn put_item(
        &self,
        table_name: String,
        item: DynamoMap,
        condition_expression: Option<String>,
    ) -> Result<PutItemOutput, SdkError<PutItemError>>;

    async fn batch_put_item(
        &self,
        table_name: String,
        items: Vec<DynamoMap>,
    ) -> Result<BatchWriteItemOutput, SdkError<BatchWriteItemError>>;

    /// Returns the item's attributes as they are after the update.
    async fn update_item(
        &self,
        table_name: String,
        key: DynamoMap,
        update_expression: String,
        expression_attribute_values: DynamoMap,
        condition_expression: Option<String>,
    ) -> Result<UpdateItemOutput, SdkError<UpdateItemError>>;

    /// Returns the item's attributes as they were before deletion, if any.
    async fn delete_item(
        &self,
        table_name: String,
        key: DynamoMap,
    ) -> Result<DeleteItemOutput, SdkError<DeleteItemError>>;
}

// Real implementation,
// making actual calls to AWS.
// --------------------------------------------------

impl ReviewStore {
    /// Builds a store over a real DynamoDB client. Intended to be called once
    /// per process, with the result shared by every request handler.
    pub async fn connect(config: &ServiceConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared_config = loader.load().await;

        let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint_url {
            dynamo_config = dynamo_config.endpoint_url(endpoint);
        }
        let client = aws_sdk_dynamodb::Client::from_conf(dynamo_config.build());

        let tables = StoreTables::from(config);
        info!(
            movie_table = %tables.movie_table,
            review_table = %tables.review_table,
            "Connected to DynamoDB for movie reviews"
        );
        Self::new(Arc::new(client), tables)
    }
}

#[async_trait]
impl DynamoBackend for aws_sdk_dynamodb::Client {
    async fn query(
        &self,
        table_name: String,
        index: Option<String>,
        key_condition: String,
        attribute_values: DynamoMap,
    ) -> Result<QueryOutput, SdkError<QueryError>> {
        self.query()
            .set_table_name(Some(table_name))
            .set_index_name(index)
            .set_key_condition_expression(Some(key_condition))
            .set_expression_attribute_values(Some(attribute_values))
            .send()
            .await
    }

    async fn scan(
        &self,
        table_name: String,
        index: Option<String>,
        filter_expression: Option<String>,
        attribute_values: Option<DynamoMap>,
    ) -> Result<ScanOutput, SdkError<ScanError>> {
        self.scan()
            .set_table_name(Some(table_name))
            .set_index_name(index)
            .set_filter_expression(filter_expression)
            .set_expression_attribute_values(attribute_values)
            .send()
            .await
    }

    async fn get_item(
        &self,
        table_name: String,
        key: DynamoMap,
    ) -> Result<GetItemOutput, SdkError<GetItemError>> {
        self.get_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .send()
            .await
    }

    async fn put_item(
        &self,
        table_name: String,
        item: DynamoMap,
        condition_expression: Option<String>,
    ) -> Result<PutItemOutput, SdkError<PutItemError>> {
        self.put_item()
            .set_table_name(Some(table_name))
            .set_item(Some(item))
            .set_condition_expression(condition_expression)
            .send()
            .await
    }

    async fn batch_put_item(
        &self,
        table_name: String,
        items: Vec<DynamoMap>,
    ) -> Result<BatchWriteItemOutput, SdkError<BatchWriteItemError>> {
        self.batch_write_item()
            .set_request_items(Some(collection!(
                table_name => items
                    .into_iter()
                    .map(|item|
                        WriteRequest::builder()
                            .put_request(PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .expect("Invalid PutRequest"))
                            .build()
                    )
                    .collect()
            )))
            .send()
            .await
    }

    async fn update_item(
        &self,
        table_name: String,
        key: DynamoMap,
        update_expression: String,
        expression_attribute_values: DynamoMap,
        condition_expression: Option<String>,
    ) -> Result<UpdateItemOutput, SdkError<UpdateItemError>> {
        self.update_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .set_update_expression(Some(update_expression))
            .set_expression_attribute_values(Some(expression_attribute_values))
            .set_condition_expression(condition_expression)
            .return_values(ReturnValue::AllNew)
            .send()
            .await
    }

    async fn delete_item(
        &self,
        table_name: String,
        key: DynamoMap,
    ) -> Result<DeleteItemOutput, SdkError<DeleteItemError>> {
        self.delete_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
    }
}

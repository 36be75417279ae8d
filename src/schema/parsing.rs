use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use fractic_server_error::ServerError;
use serde::{de::DeserializeOwned, Serialize};

use crate::{errors::ItemParsingError, store::DynamoMap};

// Converting between DynamoMap and typed records.
// --------------------------------------------------

pub fn build_dynamo_map<T: Serialize>(object: &T) -> Result<DynamoMap, ServerError> {
    // Object -> Serde value.
    let json_value = serde_json::to_value(object)
        .map_err(|e| ItemParsingError::with_debug("failed to serialize object", &e))?;

    // Serde value -> DynamoMap.
    match json_value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| Ok((key, serde_value_to_attribute_value(value)?)))
            .collect(),
        unsupported => Err(ItemParsingError::with_debug(
            "can't build DynamoMap from non-object value",
            &unsupported,
        )),
    }
}

pub fn parse_dynamo_map<T: DeserializeOwned>(map: &DynamoMap) -> Result<T, ServerError> {
    // DynamoMap -> Serde value.
    let serde_map = map
        .iter()
        .map(|(key, value)| Ok((key.clone(), attribute_value_to_serde_value(value.clone())?)))
        .collect::<Result<serde_json::Map<String, serde_json::Value>, ServerError>>()?;

    // Serde value -> object.
    serde_json::from_value(serde_json::Value::Object(serde_map))
        .map_err(|e| ItemParsingError::with_debug("failed to convert from Serde value", &e))
}

pub fn parse_dynamo_maps<T: DeserializeOwned>(maps: &[DynamoMap]) -> Result<Vec<T>, ServerError> {
    maps.iter().map(parse_dynamo_map::<T>).collect()
}

// Inner recursive functions.
// --------------------------------------------------

fn serde_value_to_attribute_value(value: serde_json::Value) -> Result<AttributeValue, ServerError> {
    match value {
        serde_json::Value::Null => Ok(AttributeValue::Null(true)),
        serde_json::Value::Bool(b) => Ok(AttributeValue::Bool(b)),
        serde_json::Value::String(s) => Ok(AttributeValue::S(s)),
        serde_json::Value::Number(n) => Ok(AttributeValue::N(n.to_string())),
        serde_json::Value::Object(map) => {
            let mut attribute_map: HashMap<String, AttributeValue> = HashMap::new();
            for (key, value) in map.into_iter() {
                attribute_map.insert(key, serde_value_to_attribute_value(value)?);
            }
            Ok(AttributeValue::M(attribute_map)) // DynamoDB M type is for Map
        }
        serde_json::Value::Array(array) => {
            let mut attribute_array: Vec<AttributeValue> = Vec::new();
            for value in array.into_iter() {
                attribute_array.push(serde_value_to_attribute_value(value)?);
            }
            Ok(AttributeValue::L(attribute_array)) // DynamoDB L type is for List
        }
    }
}

fn attribute_value_to_serde_value(value: AttributeValue) -> Result<serde_json::Value, ServerError> {
    match value {
        AttributeValue::Null(_) => Ok(serde_json::Value::Null),
        AttributeValue::Bool(b) => Ok(serde_json::Value::Bool(b)),
        AttributeValue::S(s) => Ok(serde_json::Value::String(s)),
        AttributeValue::N(n) => Ok(serde_json::Value::Number(
            n.parse()
                .map_err(|e| ItemParsingError::with_debug("failed to parse number", &e))?,
        )),
        AttributeValue::M(map) => {
            let mut serde_map: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();
            for (key, value) in map.into_iter() {
                serde_map.insert(key, attribute_value_to_serde_value(value)?);
            }
            Ok(serde_json::Value::Object(serde_map))
        }
        AttributeValue::L(array) => {
            let mut serde_array: Vec<serde_json::Value> = Vec::new();
            for value in array.into_iter() {
                serde_array.push(attribute_value_to_serde_value(value)?);
            }
            Ok(serde_json::Value::Array(serde_array))
        }
        unsupported => Err(ItemParsingError::with_debug(
            "unsupported AttributeValue type",
            &unsupported,
        )),
    }
}

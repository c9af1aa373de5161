//! # OpenAPI YAML 生成ツール
//!
//! BFF の OpenAPI 仕様を YAML 形式で標準出力に出力する。
//!
//! ```bash
//! cargo run --bin generate-openapi -p fitplan-bff > openapi/openapi.yaml
//! ```

use std::collections::BTreeSet;

use anyhow::Context;
use fitplan_bff::openapi::ApiDoc;
use serde_json::Value;
use utoipa::OpenApi;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

fn main() -> anyhow::Result<()> {
   let mut openapi = ApiDoc::openapi();
   prune_unreferenced_schemas(&mut openapi)?;
   let yaml = openapi.to_yaml().context("OpenAPI YAML 生成に失敗しました")?;
   print!("{yaml}");
   Ok(())
}

/// どこからも `$ref` されていないコンポーネントスキーマを取り除く
///
/// `body = ApiResponse<T>` は `T` を inline 展開するが、utoipa は `T` 単体の
/// スキーマも登録するため、そのままでは未参照のスキーマが残る。
fn prune_unreferenced_schemas(openapi: &mut utoipa::openapi::OpenApi) -> anyhow::Result<()> {
   let document = serde_json::to_value(&*openapi).context("JSON への変換に失敗しました")?;
   let mut referenced = BTreeSet::new();
   collect_schema_refs(&document, &mut referenced);

   if let Some(components) = &mut openapi.components {
      components
         .schemas
         .retain(|name, _| referenced.contains(name.as_str()));
   }
   Ok(())
}

fn collect_schema_refs(value: &Value, referenced: &mut BTreeSet<String>) {
   match value {
      Value::Object(map) => {
         for (key, child) in map {
            match (key.as_str(), child) {
               ("$ref", Value::String(target)) => {
                  if let Some(name) = target.strip_prefix(SCHEMA_REF_PREFIX) {
                     referenced.insert(name.to_string());
                  }
               }
               _ => collect_schema_refs(child, referenced),
            }
         }
      }
      Value::Array(items) => items
         .iter()
         .for_each(|item| collect_schema_refs(item, referenced)),
      _ => {}
   }
}

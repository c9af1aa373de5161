//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use fitplan_infra::InfraError;

use crate::error::BffError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, BffError>` に変換する
///
/// ```ignore
/// let workout = self.workouts.find_by_id(&user_id, &id).await
///     .or_not_found("Workout")?;
/// ```
pub(crate) trait FindResultExt<T> {
   /// `None` の場合は `BffError::NotFound`（`"<entity> not found"`）を返す
   fn or_not_found(self, entity_name: &str) -> Result<T, BffError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
   fn or_not_found(self, entity_name: &str) -> Result<T, BffError> {
      self?.ok_or_else(|| BffError::NotFound(format!("{entity_name} not found")))
   }
}

/// 削除結果（対象が存在したか）を `Result<(), BffError>` に変換する
pub(crate) fn ensure_deleted(deleted: bool, entity_name: &str) -> Result<(), BffError> {
   if deleted {
      Ok(())
   } else {
      Err(BffError::NotFound(format!("{entity_name} not found")))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_or_not_found_someは値を返す() {
      let result: Result<Option<i32>, InfraError> = Ok(Some(42));

      assert_eq!(result.or_not_found("Workout").unwrap(), 42);
   }

   #[test]
   fn test_or_not_found_noneはnot_foundを返す() {
      let result: Result<Option<i32>, InfraError> = Ok(None);

      let err = result.or_not_found("Meal").unwrap_err();

      assert!(matches!(err, BffError::NotFound(msg) if msg == "Meal not found"));
   }

   #[test]
   fn test_or_not_found_infra_errorはdatabaseを返す() {
      let result: Result<Option<i32>, InfraError> = Err(InfraError::unexpected("接続断"));

      assert!(matches!(
         result.or_not_found("Workout"),
         Err(BffError::Database(_))
      ));
   }

   #[test]
   fn test_ensure_deleted_削除なしはnot_found() {
      assert!(ensure_deleted(true, "Workout").is_ok());
      assert!(matches!(
         ensure_deleted(false, "Integration"),
         Err(BffError::NotFound(msg)) if msg == "Integration not found"
      ));
   }
}

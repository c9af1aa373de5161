//! # ユーザー識別
//!
//! 認証プロバイダ（Supabase Auth）が発行するユーザー ID と、
//! そのユーザーのメールアドレスを表現する。
//!
//! ユーザー ID はすべての行の所有者キーであり、
//! DB セッション変数 `app.user_id` にもこの値が設定される。

define_uuid_id! {
   /// ユーザーの一意識別子
   ///
   /// 認証プロバイダの `id` をそのまま使う（生成はテストと DB 復元のみ）。
   pub struct UserId("ユーザー ID");
}

define_validated_string! {
   /// メールアドレス（値オブジェクト）
   ///
   /// 認証プロバイダが返す値を保持する。形式の検証は認証プロバイダに委ねる。
   /// PII のため Debug 出力はマスクされる。
   pub struct Email {
      label: "メールアドレス",
      max_length: 255,
      pii: true,
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;
   use crate::DomainError;

   #[test]
   fn test_user_id_文字列からパースできる() {
      let id = UserId::new();
      let parsed: UserId = id.to_string().parse().unwrap();

      assert_eq!(parsed, id);
   }

   #[test]
   fn test_user_id_不正な文字列はバリデーションエラー() {
      let result = "not-a-uuid".parse::<UserId>();

      assert!(matches!(result, Err(DomainError::Validation(_))));
   }

   #[test]
   fn test_email_debug出力はマスクされる() {
      let email = Email::new("runner@example.com").unwrap();

      assert_eq!(email.as_str(), "runner@example.com");
      assert!(!format!("{email:?}").contains("runner"));
   }

   #[test]
   fn test_email_空文字列はエラー() {
      assert!(Email::new("   ").is_err());
   }
}

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::{not_found, DeadlineService};
use crate::error::{AppResult, ValidationError};
use crate::storage::{Contact, EmergencyContact, Storage};

/// Static list of public support lines.
pub const PUBLIC_SUPPORT_RESOURCES: &str = "🆘 公的支援窓口

【24時間対応】
- よりそいホットライン: 0120-279-338
  一般社団法人 社会的包摂サポートセンター
  24時間・無料・匿名OK

- いのちの電話: 0570-783-556
  全国いのちの電話連盟
  24時間対応（ナビダイヤル）

【学生向け】
- 大学の学生相談室（所属大学の窓口を確認）
- 大学保健管理センター

【生活困窮】
- 生活困窮者自立支援制度（市区町村の福祉窓口）
- 社会福祉協議会の生活福祉資金貸付

---
※ ARCは医療診断や緊急対応はできません。
※ 命に関わる状況では、必ず専門機関に連絡してください。
";

const NO_EMERGENCY_CONTACTS: &str = "⚠️ 緊急連絡先が登録されていません。\n\n万が一のために、信頼できる人の連絡先を登録することをお勧めします。";

/// Active emergency contacts with a ready-to-show message.
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyContacts {
    pub contacts: Vec<EmergencyContact>,
    pub message: String,
}

impl EmergencyContacts {
    pub fn new(contacts: Vec<EmergencyContact>) -> Self {
        let message = format_emergency_contacts(&contacts);
        Self { contacts, message }
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

fn format_emergency_contacts(contacts: &[EmergencyContact]) -> String {
    if contacts.is_empty() {
        return NO_EMERGENCY_CONTACTS.to_string();
    }

    let mut message = String::from(
        "🆘 緊急連絡先\n\n※ 本当に辛いとき・危ないと感じたときは、ためらわず連絡してください。\n\n",
    );

    for (idx, contact) in contacts.iter().enumerate() {
        message.push_str(&format!("{}. {}", idx + 1, contact.name));
        if !contact.relationship.is_empty() {
            message.push_str(&format!(" ({})", contact.relationship));
        }
        message.push_str(&format!("\n   📞 {}\n", contact.phone));
        if !contact.notes.is_empty() {
            message.push_str(&format!("   📝 {}\n", contact.notes));
        }
        message.push('\n');
    }

    message
}

impl DeadlineService {
    /// Store a contact.
    pub async fn add_contact(&self, contact: Contact) -> AppResult<Contact> {
        if contact.name.trim().is_empty() {
            return Err(ValidationError::field("name", "cannot be empty").into());
        }

        self.core.storage().create_contact(&contact).await?;
        info!(contact_id = %contact.id, "Contact added");
        Ok(contact)
    }

    /// All contacts by name.
    pub async fn list_contacts(&self) -> AppResult<Vec<Contact>> {
        Ok(self.core.storage().list_contacts().await?)
    }

    /// Stamp the last interaction with a contact.
    pub async fn record_interaction(&self, contact_id: &str, day: NaiveDate) -> AppResult<()> {
        self.core
            .storage()
            .touch_contact(contact_id, day)
            .await
            .map_err(not_found("contact"))
    }

    /// Store an emergency contact. Both name and phone are required.
    pub async fn add_emergency_contact(
        &self,
        contact: EmergencyContact,
    ) -> AppResult<EmergencyContact> {
        let mut missing = Vec::new();
        if contact.name.trim().is_empty() {
            missing.push("name: cannot be empty".to_string());
        }
        if contact.phone.trim().is_empty() {
            missing.push("phone: cannot be empty".to_string());
        }
        if !missing.is_empty() {
            return Err(ValidationError::Multiple(missing).into());
        }

        self.core.storage().create_emergency_contact(&contact).await?;
        info!(contact_id = %contact.id, "Emergency contact added");
        Ok(contact)
    }

    /// Active emergency contacts and their formatted listing.
    pub async fn emergency_contacts(&self) -> AppResult<EmergencyContacts> {
        let contacts = self.core.storage().list_active_emergency_contacts().await?;
        Ok(EmergencyContacts::new(contacts))
    }
}

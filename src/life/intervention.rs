use tracing::{info, warn};

use super::{CrisisLevel, CrisisVerdict, LifeSupport};
use crate::error::{AppError, AppResult};
use crate::llm::GenerationSource;
use crate::prompts;
use crate::storage::{Intervention, LifeLogEntry, Storage};

const LOW_FALLBACK: &str = "今日はここまでやったから、十分です。\n次は、水を一口飲むことだけを考えてみてください。\nそれで今日はクリア扱いにします。";

const MEDIUM_FALLBACK: &str = "いま、とても限界に近い状態だと感じています。\n今日はこれ以上進まなくていい。\n\n次の一歩は「深呼吸を1回する」だけです。\nそれができたら、それで今日は合格です。";

const HIGH_FALLBACK: &str = "いま、かなり危険な状態にいるように見えます。\n\nまず聞かせてください：今すぐ物理的に助けが必要ですか？\n\nもしそうなら、以下に連絡してください：\n- こころの健康相談統一ダイヤル: 0570-064-556\n- いのちの電話: 0570-783-556\n\nそうでない場合も、今日はもう休んでいい。\nあなたはよくここまで耐えてくれました。";

/// Level-specific message used when no model produced one.
pub fn fallback_message(level: CrisisLevel) -> &'static str {
    match level {
        CrisisLevel::High => HIGH_FALLBACK,
        CrisisLevel::Medium => MEDIUM_FALLBACK,
        CrisisLevel::Normal | CrisisLevel::Low => LOW_FALLBACK,
    }
}

impl LifeSupport {
    /// Produce, store and mark an intervention for an entry.
    ///
    /// Model failure is not an error: the level-specific fallback is used and
    /// recorded with source `canned`.
    pub async fn intervene(
        &self,
        entry: &LifeLogEntry,
        verdict: &CrisisVerdict,
    ) -> AppResult<Intervention> {
        let request = self.core.pipeline().request(
            prompts::intervention_system(verdict.level.as_u8()),
            prompts::intervention_user(entry, verdict),
        );

        let (message, source) = match self.core.pipeline().attempt_chain(&request).await {
            Ok(generation) => (generation.text, generation.source),
            Err(e) => {
                warn!(error = %e, level = verdict.level.as_u8(), "Using fallback intervention");
                (
                    fallback_message(verdict.level).to_string(),
                    GenerationSource::Canned,
                )
            }
        };

        let intervention = Intervention::new(
            entry.id.clone(),
            verdict.level.as_u8(),
            message,
            source.as_str(),
        );
        self.core.storage().create_intervention(&intervention).await?;

        if let Some(id) = &entry.id {
            self.core.storage().set_intervention_given(id).await?;
        }

        info!(
            intervention_id = %intervention.id,
            source = %source,
            "Intervention recorded"
        );
        Ok(intervention)
    }

    /// Interventions produced for a stored entry.
    pub async fn interventions_for(&self, log_id: &str) -> AppResult<Vec<Intervention>> {
        if self.core.storage().get_life_log(log_id).await?.is_none() {
            return Err(AppError::NotFound {
                entity: "life log",
                id: log_id.to_string(),
            });
        }
        Ok(self.core.storage().get_log_interventions(log_id).await?)
    }
}

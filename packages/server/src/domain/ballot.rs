//! 投票に関するドメインロジック
//!
//! - 表示対象のトピックの絞り込み（`eligible && !finalized`）
//! - 現在のラウンド（最小のラウンドキー）のトピックの選出
//! - 単一選択（選び直すと置き換わる）

use super::{
    entity::Topic,
    value_object::{RoundKey, TopicId},
};

/// トピック一覧の絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicFilter {
    pub eligible: bool,
    pub finalized: bool,
}

impl TopicFilter {
    /// 投票者に表示する条件（承認済みかつ未決着）
    pub fn visible() -> Self {
        Self {
            eligible: true,
            finalized: false,
        }
    }

    pub fn matches(&self, topic: &Topic) -> bool {
        topic.eligible == self.eligible && topic.finalized == self.finalized
    }
}

/// トピック一覧の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOrder {
    /// ラウンドキー昇順、同じキーの中では ID 昇順
    RoundThenId,
}

/// 現在のラウンドで投票対象になっているトピック
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferedTopics {
    /// 公開中のトピックがなければ `None`
    pub round: Option<RoundKey>,
    pub topics: Vec<Topic>,
}

impl OfferedTopics {
    pub fn contains(&self, topic_id: TopicId) -> bool {
        self.topics.iter().any(|topic| topic.id == topic_id)
    }

    pub fn get(&self, topic_id: TopicId) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id == topic_id)
    }
}

/// 表示対象のトピックだけをラウンドキー、ID の順で返す
pub fn visible_topics(topics: impl IntoIterator<Item = Topic>) -> Vec<Topic> {
    let mut visible: Vec<Topic> = topics.into_iter().filter(Topic::is_visible).collect();
    visible.sort_by_key(|topic| (topic.round_key, topic.id));
    visible
}

/// 最小のラウンドキーを持つ表示対象トピックを最大 `per_round` 件選ぶ
pub fn offer_round(topics: impl IntoIterator<Item = Topic>, per_round: usize) -> OfferedTopics {
    let visible = visible_topics(topics);
    let Some(round) = visible.first().map(|topic| topic.round_key) else {
        return OfferedTopics::default();
    };

    let topics = visible
        .into_iter()
        .filter(|topic| topic.round_key == round)
        .take(per_round)
        .collect();

    OfferedTopics {
        round: Some(round),
        topics,
    }
}

/// 単一選択の状態
///
/// 同じトピックを選ぶと解除、別のトピックを選ぶと置き換え。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteSelection {
    selected: Option<TopicId>,
}

impl VoteSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 選択をトグルし、選択後の状態を返す
    pub fn select(&mut self, topic_id: TopicId) -> Option<TopicId> {
        self.selected = match self.selected {
            Some(current) if current == topic_id => None,
            _ => Some(topic_id),
        };
        self.selected
    }

    pub fn selected(&self) -> Option<TopicId> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// 一覧から消えたトピックの選択を外す
    pub fn retain_offered(&mut self, offered: &OfferedTopics) {
        if let Some(current) = self.selected
            && !offered.contains(current)
        {
            self.selected = None;
        }
    }
}

//! Message formatting utilities for client display.

use quorum_server::infrastructure::dto::{
    http::{OfferedTopicsResponse, VoteResponse},
    websocket::{LobbyStateDto, LobbyStatusDto},
};
use quorum_shared::time::timestamp_to_rfc3339;

use crate::domain::seconds_remaining;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a lobby status update
    ///
    /// # Arguments
    ///
    /// * `status` - The status pushed by the server
    /// * `now` - Current Unix timestamp (milliseconds), used for the countdown
    pub fn format_lobby_status(status: &LobbyStatusDto, now: i64) -> String {
        let online = format!("{}/{} online", status.online_count, status.quorum_size);
        match status.state {
            LobbyStateDto::Waiting => {
                format!("\n… Waiting for players ({})\n", online)
            }
            LobbyStateDto::QuorumReached => match status.countdown_ends_at {
                Some(ends_at) => format!(
                    "\n✓ Quorum reached ({}). Voting opens in {}s\n",
                    online,
                    seconds_remaining(ends_at, now)
                ),
                None => format!("\n✓ Quorum reached ({})\n", online),
            },
            LobbyStateDto::Released => format!("\n✓ Lobby released ({})\n", online),
        }
    }

    /// Format the one-time release notification
    pub fn format_lobby_released(released_at: i64) -> String {
        format!(
            "\n{}\nVoting is open (released at {})\n{}\n",
            RULE,
            timestamp_to_rfc3339(released_at),
            RULE
        )
    }

    /// Format the offered topics with their index and tally
    ///
    /// # Arguments
    ///
    /// * `offered` - Topics of the current round
    /// * `selected` - The selected topic, marked with `[x]`
    pub fn format_offered_topics(
        offered: &OfferedTopicsResponse,
        selected: Option<i64>,
    ) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');

        match offered.round {
            Some(round) => output.push_str(&format!("Round {}\n", round)),
            None => output.push_str("No topics are open for voting\n"),
        }
        for (index, topic) in offered.topics.iter().enumerate() {
            let mark = if selected == Some(topic.id) { "x" } else { " " };
            let plural = if topic.votes == 1 { "" } else { "s" };
            output.push_str(&format!(
                "[{}] {}. {} (level {}, by {}) - {} vote{}\n",
                mark,
                index + 1,
                topic.title,
                topic.level,
                topic.proposed_by,
                topic.votes,
                plural
            ));
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a confirmation after a successful vote
    pub fn format_vote_receipt(receipt: &VoteResponse) -> String {
        format!(
            "\n✓ Vote recorded for topic {} in round {}\n",
            receipt.topic_id, receipt.round
        )
    }

    pub fn format_help() -> String {
        "\nCommands:\n  \
         <number>  select or unselect a topic\n  \
         v         vote for the selected topic\n  \
         r         refresh the topics\n  \
         q         quit\n"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_server::infrastructure::dto::http::TopicDto;

    fn status(state: LobbyStateDto, countdown_ends_at: Option<i64>) -> LobbyStatusDto {
        LobbyStatusDto {
            state,
            online_count: 3,
            quorum_size: 4,
            countdown_ends_at,
        }
    }

    fn topic(id: i64, title: &str, votes: u64) -> TopicDto {
        TopicDto {
            id,
            title: title.to_string(),
            proposed_by: "alice".to_string(),
            round_key: 2,
            level: 1,
            votes,
        }
    }

    #[test]
    fn test_format_waiting_status() {
        // テスト項目: Waiting ではオンライン人数とクォーラムが表示される
        // given (前提条件):
        let status = status(LobbyStateDto::Waiting, None);

        // when (操作):
        let result = MessageFormatter::format_lobby_status(&status, 0);

        // then (期待する結果):
        assert!(result.contains("Waiting for players"));
        assert!(result.contains("3/4 online"));
    }

    #[test]
    fn test_format_countdown_status() {
        // テスト項目: QuorumReached では残り秒数が表示される
        // given (前提条件):
        let status = status(LobbyStateDto::QuorumReached, Some(10_000));

        // when (操作):
        let result = MessageFormatter::format_lobby_status(&status, 6_500);

        // then (期待する結果):
        assert!(result.contains("Quorum reached"));
        assert!(result.contains("Voting opens in 4s"));
    }

    #[test]
    fn test_format_lobby_released() {
        // テスト項目: 解放通知には UTC の時刻が表示される
        // given (前提条件):
        let released_at = 1672531200123;

        // when (操作):
        let result = MessageFormatter::format_lobby_released(released_at);

        // then (期待する結果):
        assert!(result.contains("Voting is open"));
        assert!(result.contains("2023-01-01T00:00:00.123Z"));
    }

    #[test]
    fn test_format_offered_topics_marks_selection() {
        // テスト項目: 選択中のトピックに印が付き、番号と票数が表示される
        // given (前提条件):
        let offered = OfferedTopicsResponse {
            round: Some(2),
            topics: vec![topic(7, "Dragons", 1), topic(9, "Pirates", 2)],
        };

        // when (操作):
        let result = MessageFormatter::format_offered_topics(&offered, Some(9));

        // then (期待する結果):
        assert!(result.contains("Round 2"));
        assert!(result.contains("[ ] 1. Dragons (level 1, by alice) - 1 vote\n"));
        assert!(result.contains("[x] 2. Pirates (level 1, by alice) - 2 votes\n"));
    }

    #[test]
    fn test_format_offered_topics_without_round() {
        // テスト項目: 公開中のトピックがない場合はその旨が表示される
        // given (前提条件):
        let offered = OfferedTopicsResponse {
            round: None,
            topics: Vec::new(),
        };

        // when (操作):
        let result = MessageFormatter::format_offered_topics(&offered, None);

        // then (期待する結果):
        assert!(result.contains("No topics are open for voting"));
    }

    #[test]
    fn test_format_vote_receipt() {
        // テスト項目: 投票の確認メッセージにトピックとラウンドが表示される
        // given (前提条件):
        let receipt = VoteResponse {
            topic_id: 7,
            round: 2,
            offered: None,
        };

        // when (操作):
        let result = MessageFormatter::format_vote_receipt(&receipt);

        // then (期待する結果):
        assert_eq!(result, "\n✓ Vote recorded for topic 7 in round 2\n");
    }
}

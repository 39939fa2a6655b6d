//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// # Returns
///
/// `true` if retrying cannot help (rejected credentials, a second connection
/// for the same account), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::InvalidCredentials | ClientError::AlreadyConnected
    )
}

/// Check if the client should attempt to reconnect to the lobby.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Seconds left until `ends_at`, rounded up (0 once passed)
pub fn seconds_remaining(ends_at: i64, now: i64) -> i64 {
    let millis = (ends_at - now).max(0);
    (millis + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_with_already_connected() {
        // テスト項目: AlreadyConnected エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::AlreadyConnected;

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_invalid_credentials() {
        // テスト項目: InvalidCredentials エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::InvalidCredentials;

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_with_already_connected() {
        // テスト項目: AlreadyConnected エラーの場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::AlreadyConnected;

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 4, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_seconds_remaining_rounds_up() {
        // テスト項目: 残り時間は秒単位で切り上げ、過ぎていれば 0
        // given (前提条件):
        let ends_at = 10_000;

        // when (操作):
        let partial = seconds_remaining(ends_at, 5_500);
        let exact = seconds_remaining(ends_at, 7_000);
        let passed = seconds_remaining(ends_at, 12_000);

        // then (期待する結果):
        assert_eq!(partial, 5);
        assert_eq!(exact, 3);
        assert_eq!(passed, 0);
    }
}

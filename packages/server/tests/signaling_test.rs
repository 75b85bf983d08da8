//! End-to-end signaling tests against an in-process server.

mod common;

use serde_json::json;
use tsunagi_server::usecase::UnroutedPolicy;

use common::{
    assert_silent, connect, count_frames_until_closed, expect_closed, join, recv_json, recv_text,
    send_binary, send_ping, send_text, spawn_server,
};

#[tokio::test]
async fn test_offer_answer_scenario() {
    // テスト項目: join → user-list / new-user → offer 転送 → 切断時の leave の一連の流れ
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;

    // when (操作) / then (期待する結果):
    let mut alice = join(addr, "A", "lobby").await;
    assert_eq!(recv_json(&mut alice).await, json!({"type": "user-list", "users": []}));

    let mut bob = join(addr, "B", "lobby").await;
    assert_eq!(
        recv_json(&mut bob).await,
        json!({"type": "user-list", "users": ["A"]})
    );
    assert_eq!(recv_json(&mut alice).await, json!({"type": "new-user", "name": "B"}));

    let offer = r#"{"type":"offer","target":"B","sdp":"..."}"#;
    send_text(&mut alice, offer).await;
    assert_eq!(recv_text(&mut bob).await, offer);

    bob.close(None).await.expect("Failed to close bob");
    assert_eq!(recv_json(&mut alice).await, json!({"type": "leave", "name": "B"}));
}

#[tokio::test]
async fn test_same_name_rejoin_evicts_previous_connection() {
    // テスト項目: 同名で再参加すると古い接続が閉じられ、leave は通知されない
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut observer = join(addr, "O", "lobby").await;
    recv_json(&mut observer).await;
    let mut first = join(addr, "A", "lobby").await;
    recv_json(&mut first).await;
    assert_eq!(
        recv_json(&mut observer).await,
        json!({"type": "new-user", "name": "A"})
    );

    // when (操作):
    let mut second = join(addr, "A", "lobby").await;

    // then (期待する結果):
    assert_eq!(
        recv_json(&mut second).await,
        json!({"type": "user-list", "users": ["O"]})
    );
    expect_closed(&mut first).await;
    assert_eq!(
        recv_json(&mut observer).await,
        json!({"type": "new-user", "name": "A"})
    );

    // The successor is still routable and no stale leave was broadcast
    let answer = r#"{"type":"answer","target":"O","sdp":"v=0"}"#;
    send_text(&mut second, answer).await;
    assert_eq!(recv_text(&mut observer).await, answer);
}

#[tokio::test]
async fn test_invalid_first_message_closes_connection() {
    // テスト項目: 最初のメッセージが join でなければ接続が閉じられる
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let inputs = [
        r#"{"type":"offer","target":"B"}"#,
        "definitely not json",
        r#"{"type":"join","name":"","room":"lobby"}"#,
        r#"{"type":"join","name":"A"}"#,
    ];

    for input in inputs {
        // when (操作):
        let mut ws = connect(addr).await;
        send_text(&mut ws, input).await;

        // then (期待する結果):
        expect_closed(&mut ws).await;
    }
}

#[tokio::test]
async fn test_forward_to_unknown_target_is_discarded() {
    // テスト項目: 存在しない宛先への offer は誰にも届かない
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    recv_json(&mut alice).await;

    // when (操作):
    send_text(&mut alice, r#"{"type":"candidate","target":"ghost"}"#).await;
    let chat = r#"{"type":"chat","text":"still here"}"#;
    send_text(&mut alice, chat).await;

    // then (期待する結果): bob only sees the broadcast chat
    assert_eq!(recv_text(&mut bob).await, chat);
    assert_silent(&mut bob).await;
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: 別ルームのメンバーにはブロードキャストも presence も届かない
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut carol = join(addr, "C", "garden").await;

    // when (操作):
    assert_eq!(recv_json(&mut carol).await, json!({"type": "user-list", "users": []}));
    send_text(&mut carol, r#"{"type":"chat"}"#).await;
    send_text(&mut carol, r#"{"type":"offer","target":"A"}"#).await;

    // then (期待する結果):
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_leave_message_ends_session() {
    // テスト項目: leave メッセージで退出すると他のメンバーに leave が届き、接続が閉じられる
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    recv_json(&mut alice).await;

    // when (操作):
    send_text(&mut bob, r#"{"type":"leave"}"#).await;

    // then (期待する結果):
    assert_eq!(recv_json(&mut alice).await, json!({"type": "leave", "name": "B"}));
    expect_closed(&mut bob).await;
}

#[tokio::test]
async fn test_ignore_policy_drops_unrouted_messages() {
    // テスト項目: Ignore ポリシーではその他メッセージが中継されず、転送は行われる
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Ignore).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    recv_json(&mut alice).await;

    // when (操作):
    send_text(&mut alice, r#"{"type":"chat","text":"hello"}"#).await;
    let offer = r#"{"type":"offer","target":"B"}"#;
    send_text(&mut alice, offer).await;

    // then (期待する結果):
    assert_eq!(recv_text(&mut bob).await, offer);
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_malformed_steady_state_message_is_not_fatal() {
    // テスト項目: 参加後の不正な JSON は破棄され、接続は維持される
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    recv_json(&mut alice).await;

    // when (操作):
    send_text(&mut alice, "{broken").await;
    let offer = r#"{"type":"offer","target":"B"}"#;
    send_text(&mut alice, offer).await;

    // then (期待する結果):
    assert_eq!(recv_text(&mut bob).await, offer);
}

#[tokio::test]
async fn test_evicted_connection_is_not_fed_its_backlog() {
    // テスト項目: 読み取りを止めたクライアントが同名参加で追い出されたとき、滞留分を流し続けずに閉じられる
    // given (前提条件): A の送信キューと TCP バッファに大量のメッセージが溜まっている
    const BACKLOG: usize = 200;
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut stalled = join(addr, "A", "lobby").await;
    recv_json(&mut stalled).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;

    let chat = json!({"type": "chat", "body": "x".repeat(200 * 1024)}).to_string();
    for _ in 0..BACKLOG {
        send_text(&mut bob, &chat).await;
    }
    // Messages from one connection are handled in order, so once bob's
    // self-addressed offer comes back every chat has been queued for A.
    let marker = r#"{"type":"offer","target":"B"}"#;
    send_text(&mut bob, marker).await;
    assert_eq!(recv_text(&mut bob).await, marker);

    // when (操作):
    let mut successor = join(addr, "A", "lobby").await;
    assert_eq!(
        recv_json(&mut successor).await,
        json!({"type": "user-list", "users": ["B"]})
    );

    // then (期待する結果): 既に TCP バッファに載った分以外は届かずに接続が終わる
    let received = count_frames_until_closed(&mut stalled).await;
    assert!(
        received < BACKLOG,
        "evicted connection received {received} frames before closing"
    );
}

#[tokio::test]
async fn test_binary_frames_are_read_as_text() {
    // テスト項目: UTF-8 JSON を運ぶバイナリフレームは join にも通常のメッセージにも使える
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = connect(addr).await;

    // when (操作):
    send_binary(&mut alice, r#"{"type":"join","name":"A","room":"lobby"}"#).await;

    // then (期待する結果):
    assert_eq!(recv_json(&mut alice).await, json!({"type": "user-list", "users": []}));

    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    assert_eq!(recv_json(&mut alice).await, json!({"type": "new-user", "name": "B"}));

    // Relayed as a text frame with the same content
    let offer = r#"{"type":"offer","target":"A","sdp":"v=0"}"#;
    send_binary(&mut bob, offer).await;
    assert_eq!(recv_text(&mut alice).await, offer);
}

#[tokio::test]
async fn test_ping_before_join_is_skipped() {
    // テスト項目: join より前の Ping は最初のメッセージとして扱われない
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = connect(addr).await;

    // when (操作):
    send_ping(&mut alice).await;
    send_text(
        &mut alice,
        r#"{"type":"join","name":"A","room":"lobby"}"#,
    )
    .await;

    // then (期待する結果):
    assert_eq!(recv_json(&mut alice).await, json!({"type": "user-list", "users": []}));
}

#[tokio::test]
async fn test_abrupt_disconnect_broadcasts_leave() {
    // テスト項目: クローズハンドシェイクなしに TCP が切れても後始末が走り leave が通知される
    // given (前提条件):
    let addr = spawn_server(UnroutedPolicy::Broadcast).await;
    let mut alice = join(addr, "A", "lobby").await;
    recv_json(&mut alice).await;
    let mut bob = join(addr, "B", "lobby").await;
    recv_json(&mut bob).await;
    recv_json(&mut alice).await;

    // when (操作):
    drop(bob);

    // then (期待する結果):
    assert_eq!(recv_json(&mut alice).await, json!({"type": "leave", "name": "B"}));

    let mut rejoined = join(addr, "B", "lobby").await;
    assert_eq!(
        recv_json(&mut rejoined).await,
        json!({"type": "user-list", "users": ["A"]})
    );
}

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, stream::StreamExt};
use parking_lot::Mutex as P_Mutex;
use tokio::sync::{RwLock, mpsc};
use tracing::info;

use uno_party_core::{
    ClientMessage, GameState, PlayerId, ServerMessage, draw_card, join_game, play_card,
    remove_player, reset_game, say_uno, start_game,
};

// 服务器全局状态：单场对局 + 在线玩家的连接表
// 重要‼️：严格规定使用锁的顺序，避免死锁：
// connections -> game
struct AppState {
    game: P_Mutex<GameState>,
    // 将 PlayerId 映射到具体的网络连接
    connections: RwLock<HashMap<PlayerId, mpsc::Sender<ServerMessage>>>,
}

type SharedState = Arc<AppState>;

const DEFAULT_ADDR: &str = "0.0.0.0:25918";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let state = SharedState::new(AppState {
        game: P_Mutex::new(GameState::default()),
        connections: RwLock::new(HashMap::new()),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    // 监听地址可用 UNO_PARTY_ADDR 覆盖
    let addr: SocketAddr = std::env::var("UNO_PARTY_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .expect("监听地址格式不正确");
    info!("服务器正在监听 {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = serde_json::to_string(&msg).unwrap();
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接绑定的玩家，在 JoinGame 之后填充
    let mut player_context: Option<PlayerId> = None;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, state.clone(), &tx, &mut player_context)
                        .await;
                }
                Err(e) => {
                    tracing::warn!("解析消息失败: {}", e);
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some(player_id) = player_context {
        handle_disconnect(state, player_id).await;
    }
    info!("客户端连接关闭");
}

/// 核心消息处理逻辑
///
/// 每条指令都在一次锁持有期内完成状态迁移，
/// 拿到要下发的消息批次后再释放锁、执行分发。
async fn handle_client_message(
    msg: ClientMessage,
    state: SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<PlayerId>,
) {
    let messages = match msg {
        ClientMessage::JoinGame { player_id, name } => {
            if context.is_some() {
                vec![ServerMessage::Error {
                    kind: "already-joined".to_string(),
                    message: "你已经加入过这场对局了".to_string(),
                }]
            } else {
                {
                    let mut connections = state.connections.write().await;
                    connections.insert(player_id, tx.clone());
                }
                *context = Some(player_id);
                info!("玩家 {} ({}) 加入了对局", name, player_id);
                join_game(&mut state.game.lock(), player_id, name)
            }
        }
        ClientMessage::StartGame => {
            info!("收到开局请求");
            start_game(&mut state.game.lock())
        }
        ClientMessage::PlayCard {
            player_id,
            card_id,
            chosen_color,
        } => play_card(&mut state.game.lock(), player_id, card_id, chosen_color),
        ClientMessage::DrawCard { player_id } => draw_card(&mut state.game.lock(), player_id),
        ClientMessage::SayUno { player_id } => say_uno(player_id),
        ClientMessage::ResetGame => {
            info!("对局被重置");
            reset_game(&mut state.game.lock())
        }
    };

    dispatch(&state, Some(tx), messages).await;
}

/// 玩家断开连接后的处理
async fn handle_disconnect(state: SharedState, player_id: PlayerId) {
    info!("玩家 {} 断开连接", player_id);

    {
        let mut connections = state.connections.write().await;
        connections.remove(&player_id);
    }

    let messages = remove_player(&mut state.game.lock(), player_id);
    dispatch(&state, None, messages).await;
}

/// 按消息类型分发
///
/// Error 只回给发起者；GameStateSnapshot 为每个在线玩家
/// 单独脱敏后发送；其余消息原样广播。
async fn dispatch(
    state: &SharedState,
    origin: Option<&mpsc::Sender<ServerMessage>>,
    messages: Vec<ServerMessage>,
) {
    for msg in messages {
        match &msg {
            ServerMessage::Error { .. } => {
                // 错误消息只发给当前玩家
                if let Some(tx) = origin {
                    let _ = tx.send(msg).await;
                }
            }
            ServerMessage::GameStateSnapshot(gs) => {
                // 快照需要为每个玩家单独生成
                let connections = state.connections.read().await;
                for (pid, conn) in connections.iter() {
                    let personalized = gs.for_client(pid);
                    let _ = conn.send(ServerMessage::GameStateSnapshot(personalized)).await;
                }
            }
            _ => {
                let connections = state.connections.read().await;
                broadcast(connections.iter(), &msg).await;
            }
        }
    }
}

/// 向所有在线玩家广播消息
async fn broadcast(
    connections: impl Iterator<Item = (&PlayerId, &mpsc::Sender<ServerMessage>)>,
    message: &ServerMessage,
) {
    for (player_id, conn) in connections {
        if conn.send(message.clone()).await.is_err() {
            // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
            tracing::warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
        }
    }
}

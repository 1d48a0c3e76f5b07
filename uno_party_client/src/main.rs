use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;
use uuid::Uuid;

use uno_party_core::{CardColor, ClientMessage, GameState, ServerMessage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse("ws://127.0.0.1:25918/ws").unwrap();

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await.expect("无法连接");
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 本客户端的玩家 ID，会话期间保持不变
    let player_id = Uuid::new_v4();
    // 保存最近一次快照，出牌时用序号定位手牌
    let latest_state: Arc<Mutex<Option<GameState>>> = Arc::new(Mutex::new(None));

    // 启动一个任务来处理从服务器接收的消息
    let reader_state = latest_state.clone();
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::GameStateSnapshot(gs)) => {
                        render_snapshot(&gs, &player_id);
                        *reader_state.lock().unwrap() = Some(gs);
                        prompt();
                    }
                    Ok(ServerMessage::Error { kind, message }) => {
                        println!("\n<-- [错误 {}]: {}", kind, message);
                        prompt();
                    }
                    Ok(server_msg) => {
                        println!("\n<-- [服务器消息]: {:?}", server_msg);
                        prompt();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- UNO 客户端 ---");
    println!("可用命令:");
    println!("  join <昵称>           - 加入对局");
    println!("  start                 - 开始游戏");
    println!("  play <序号> [颜色]    - 按序号出牌，万能牌要带颜色 (red/yellow/green/blue)");
    println!("  draw                  - 摸一张牌");
    println!("  uno                   - 喊 UNO");
    println!("  reset                 - 重置对局");
    println!("  exit                  - 退出");

    loop {
        prompt();

        let line = stdin.next_line().await?.unwrap_or_default();
        let parts: Vec<&str> = line.trim().split_whitespace().collect();
        let command = parts.get(0).cloned();

        let client_msg = match command {
            Some("join") => {
                let name = parts.get(1).unwrap_or(&"新玩家").to_string();
                Some(ClientMessage::JoinGame { player_id, name })
            }
            Some("start") => Some(ClientMessage::StartGame),
            Some("play") => {
                if parts.len() < 2 {
                    println!("用法: play <序号> [颜色]");
                    continue;
                }
                let index: usize = match parts[1].parse() {
                    Ok(i) => i,
                    Err(_) => {
                        println!("无效的手牌序号");
                        continue;
                    }
                };
                // 从最近的快照里把序号换成牌的 id
                let card_id = {
                    let guard = latest_state.lock().unwrap();
                    guard
                        .as_ref()
                        .and_then(|gs| gs.players.iter().find(|p| p.id == player_id))
                        .and_then(|p| p.cards.get(index))
                        .map(|c| c.id)
                };
                let Some(card_id) = card_id else {
                    println!("找不到序号为 {} 的手牌", index);
                    continue;
                };
                let chosen_color = parts.get(2).and_then(|s| parse_color(s));
                Some(ClientMessage::PlayCard {
                    player_id,
                    card_id,
                    chosen_color,
                })
            }
            Some("draw") => Some(ClientMessage::DrawCard { player_id }),
            Some("uno") => Some(ClientMessage::SayUno { player_id }),
            Some("reset") => Some(ClientMessage::ResetGame),
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        if let Some(msg) = client_msg {
            let payload = serde_json::to_string(&msg)?;
            write.send(Message::Text(payload.into())).await?;
        }
    }

    Ok(())
}

/// 打印一份快照：状态、堆顶、各玩家手牌
fn render_snapshot(gs: &GameState, player_id: &Uuid) {
    println!();
    println!("=== 对局状态: {:?} | 方向: {:?} ===", gs.status, gs.direction);
    if let Some(top) = &gs.top_card {
        println!("弃牌堆顶: {}", top);
    }
    for player in &gs.players {
        let marker = if player.is_current_player { "→" } else { " " };
        if player.id == *player_id {
            println!("{} {} (你):", marker, player.name);
            for (i, card) in player.cards.iter().enumerate() {
                println!("    [{}] {}", i, card);
            }
        } else {
            println!("{} {}: {} 张手牌", marker, player.name, player.cards.len());
        }
    }
    if let Some(winner_id) = &gs.winner {
        let winner_name = gs
            .players
            .iter()
            .find(|p| p.id == *winner_id)
            .map_or("未知玩家", |p| p.name.as_str());
        println!("🏆 获胜者: {}", winner_name);
    }
}

fn prompt() {
    print!("> ");
    std::io::stdout().flush().unwrap();
}

/// 解析用户输入的颜色
fn parse_color(s: &str) -> Option<CardColor> {
    match s {
        "red" | "红" => Some(CardColor::Red),
        "yellow" | "黄" => Some(CardColor::Yellow),
        "green" | "绿" => Some(CardColor::Green),
        "blue" | "蓝" => Some(CardColor::Blue),
        _ => None,
    }
}

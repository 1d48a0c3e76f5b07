use crate::card::{CardColor, CardId};
use crate::state::{GameError, GameState, Player, PlayerId};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ClientMessage {
    /// 加入对局；player_id 由客户端生成，会话期间保持稳定
    JoinGame { player_id: PlayerId, name: String },
    /// 请求开局（需要至少 2 名玩家）
    StartGame,
    /// 出牌；打出万能牌时必须附带选定的颜色
    PlayCard {
        player_id: PlayerId,
        card_id: CardId,
        chosen_color: Option<CardColor>,
    },
    /// 从牌堆摸一张牌，摸完回合顺延
    DrawCard { player_id: PlayerId },
    /// 喊 UNO（只剩一张牌时的提示信号）
    SayUno { player_id: PlayerId },
    /// 把对局重置回等待状态
    ResetGame,
}

// --- 服务器 -> 客户端 的消息 ---
// 这些是服务器在对局状态改变后发给客户端的事件通知。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 完整对局状态的快照。
    /// 每次状态变化后下发，发送前会按接收方调用
    /// state.for_client(client_id) 隐藏敏感信息。
    GameStateSnapshot(GameState),

    /// 一个新玩家加入了对局
    PlayerJoined { player: Player },

    /// 对局开始
    GameStarted,

    /// 有玩家出了一张牌
    CardPlayed {
        card_id: CardId,
        player_id: PlayerId,
        chosen_color: Option<CardColor>,
    },

    /// 有玩家摸了一张牌
    CardDrawn { player_id: PlayerId },

    /// 有玩家喊了 UNO
    PlayerSaidUno { player_id: PlayerId },

    /// 有玩家离开了对局
    PlayerLeft { player_id: PlayerId },

    /// 只发给发起请求玩家的错误信息，从不广播
    Error { kind: String, message: String },
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

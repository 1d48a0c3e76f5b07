use crate::card::Card;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type PlayerId = Uuid;

/// 单场对局的权威状态
///
/// 服务端只持有这一份，所有状态迁移都在它上面原子地完成。
/// `players` 的顺序就是出牌顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    /// 当前应该行动的玩家，对局未进行时为 None
    pub current_player_id: Option<PlayerId>,
    /// 弃牌堆顶，新出的牌要和它匹配
    pub top_card: Option<Card>,
    pub direction: Direction,
    // 服务端持有的完整牌堆，不会发给客户端。
    #[serde(skip)] // 确保deck不会被序列化发给客户端
    pub deck: Vec<Card>,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 手牌，只有玩家本人能看到真实内容
    pub cards: Vec<Card>,
    pub is_current_player: bool,
}

/// 回合前进的方向，只会在 Reverse 牌上翻转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Clockwise,
    Counterclockwise,
}

impl Direction {
    pub fn flipped(self) -> Direction {
        match self {
            Direction::Clockwise => Direction::Counterclockwise,
            Direction::Counterclockwise => Direction::Clockwise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            players: Vec::new(),
            current_player_id: None,
            top_card: None,
            direction: Direction::Clockwise,
            deck: Vec::new(),
            status: GameStatus::Waiting,
            winner: None,
        }
    }
}

// --- GameState 的实现方法 ---

impl GameState {
    /// 根据 PlayerId 查找玩家在出牌顺序中的索引
    pub fn player_index(&self, player_id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *player_id)
    }

    /// 把行动标记移到指定索引的玩家，保证任何时刻只有一人持有
    pub(crate) fn set_current_player(&mut self, idx: usize) {
        for (i, player) in self.players.iter_mut().enumerate() {
            player.is_current_player = i == idx;
        }
        self.current_player_id = Some(self.players[idx].id);
    }

    /// 为指定客户端生成脱敏后的状态副本
    ///
    /// 其他玩家的手牌会被替换成等长的占位牌，只暴露手牌数量；
    /// 牌堆永远不会下发。
    pub fn for_client(&self, client_id: &PlayerId) -> Self {
        let mut client_state = self.clone();
        client_state.deck.clear();

        for player in client_state.players.iter_mut() {
            if player.id != *client_id {
                player.cards = player.cards.iter().map(|_| Card::hidden()).collect();
            }
        }

        client_state
    }
}

// --- 错误定义 ---

/// 操作被拒绝的原因，只回发给发起请求的玩家，从不广播
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("至少需要 2 名玩家才能开始游戏")]
    InsufficientPlayers,
    #[error("还没轮到你行动")]
    NotYourTurn,
    #[error("你的手牌里没有这张牌")]
    CardNotFound,
    #[error("这张牌现在不能出")]
    IllegalPlay,
}

impl GameError {
    /// 错误类别的稳定标识，随错误消息一起下发给客户端
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InsufficientPlayers => "insufficient-players",
            GameError::NotYourTurn => "not-your-turn",
            GameError::CardNotFound => "card-not-found",
            GameError::IllegalPlay => "illegal-play",
        }
    }
}

// --- 单元测试 ---

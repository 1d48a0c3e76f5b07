use crate::card::{Card, CardColor, CardId, CardValue, create_deck, draw_from_pile, shuffle_deck};
use crate::message::ServerMessage;
use crate::state::{Direction, GameError, GameState, GameStatus, Player, PlayerId};

/// 每位玩家开局发到的手牌数
pub const HAND_SIZE: usize = 7;

// --- 规则判定（纯函数） ---

/// 判断 candidate 能否压在 top 上
///
/// 万能牌永远可出；否则颜色匹配 top 的生效颜色、
/// 或牌面相同时可出。
pub fn can_play_card(candidate: &Card, top: &Card) -> bool {
    if candidate.color == CardColor::Wild {
        return true;
    }
    if candidate.color == top.effective_color() {
        return true;
    }
    candidate.value == top.value
}

/// 沿指定方向前进一步后的索引，始终对在场人数取模
pub fn next_index(idx: usize, count: usize, direction: Direction) -> usize {
    match direction {
        Direction::Clockwise => (idx + 1) % count,
        Direction::Counterclockwise => (idx + count - 1) % count,
    }
}

/// 一次出牌结算出的回合走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// 下一个行动玩家的索引
    pub next_idx: usize,
    /// 结算后的方向
    pub direction: Direction,
    /// 被罚摸的玩家索引及张数
    pub forced_draw: Option<(usize, usize)>,
}

/// 结算一张牌的功能效果
///
/// 先沿当前方向算出原始的下一家，再按牌面修正：
/// - Skip：原始下一家被跳过；
/// - Reverse：方向翻转，下一家是出牌者在新方向上的邻座；
/// - Draw2 / WildDraw4：原始下一家罚摸 2/4 张并被跳过；
/// - 数字牌和普通万能牌：原始下一家行动。
///
/// 两人局里 Skip 和罚摸后的跳过都会让回合回到出牌者自己，
/// 这是模 2 运算的自然结果，不做特判。
pub fn resolve_effect(
    value: CardValue,
    player_idx: usize,
    count: usize,
    direction: Direction,
) -> TurnOutcome {
    let raw_next = next_index(player_idx, count, direction);
    match value {
        CardValue::Skip => TurnOutcome {
            next_idx: next_index(raw_next, count, direction),
            direction,
            forced_draw: None,
        },
        CardValue::Reverse => {
            let flipped = direction.flipped();
            TurnOutcome {
                next_idx: next_index(player_idx, count, flipped),
                direction: flipped,
                forced_draw: None,
            }
        }
        CardValue::Draw2 => TurnOutcome {
            next_idx: next_index(raw_next, count, direction),
            direction,
            forced_draw: Some((raw_next, 2)),
        },
        CardValue::WildDraw4 => TurnOutcome {
            next_idx: next_index(raw_next, count, direction),
            direction,
            forced_draw: Some((raw_next, 4)),
        },
        _ => TurnOutcome {
            next_idx: raw_next,
            direction,
            forced_draw: None,
        },
    }
}

// --- 对局状态迁移 ---
// 每个操作都在服务端的锁内一次性执行完，返回要下发的消息：
// Error 只回发起者，GameStateSnapshot 按接收方脱敏，其余广播。

/// 玩家加入对局
///
/// 不阻止中途加入：Playing 状态下加入的玩家手牌为空，
/// 只是把回合环扩大一席。第一位加入者按惯例先拿到行动标记，
/// 开局时会被重新设置。
pub fn join_game(state: &mut GameState, player_id: PlayerId, name: String) -> Vec<ServerMessage> {
    let player = Player {
        id: player_id,
        name,
        cards: Vec::new(),
        is_current_player: state.players.is_empty(),
    };
    state.players.push(player.clone());

    vec![
        ServerMessage::PlayerJoined { player },
        ServerMessage::GameStateSnapshot(state.clone()),
    ]
}

/// 开始新对局
///
/// 建一副新牌洗匀，轮流发牌（每轮每人一张，共发 7 轮），
/// 然后翻出第一张弃牌堆顶；若翻出万能牌则再翻一张，
/// 被翻掉的万能牌直接弃置，不放回牌堆。
pub fn start_game(state: &mut GameState) -> Vec<ServerMessage> {
    if state.players.len() < 2 {
        return vec![GameError::InsufficientPlayers.into()];
    }

    let mut deck = create_deck();
    shuffle_deck(&mut deck);

    for player in state.players.iter_mut() {
        player.cards.clear();
    }
    for _ in 0..HAND_SIZE {
        for idx in 0..state.players.len() {
            if let Some(card) = deck.pop() {
                state.players[idx].cards.push(card);
            }
        }
    }

    let mut top = deck.pop();
    if top.as_ref().is_some_and(|c| c.color == CardColor::Wild) {
        top = deck.pop();
    }

    state.deck = deck;
    state.top_card = top;
    state.direction = Direction::Clockwise;
    state.status = GameStatus::Playing;
    state.winner = None;
    state.set_current_player(0);

    vec![
        ServerMessage::GameStarted,
        ServerMessage::GameStateSnapshot(state.clone()),
    ]
}

/// 处理一次出牌
///
/// 依次校验回合归属、手牌归属、规则合法性，任何一项不通过
/// 只向发起者回错误，状态不动。打空手牌立即判胜，
/// 这张牌的功能效果不再作用于其他玩家。
pub fn play_card(
    state: &mut GameState,
    player_id: PlayerId,
    card_id: CardId,
    chosen_color: Option<CardColor>,
) -> Vec<ServerMessage> {
    if state.status != GameStatus::Playing || state.current_player_id != Some(player_id) {
        return vec![GameError::NotYourTurn.into()];
    }
    let Some(player_idx) = state.player_index(&player_id) else {
        return vec![GameError::NotYourTurn.into()];
    };

    let Some(card_idx) = state.players[player_idx]
        .cards
        .iter()
        .position(|c| c.id == card_id)
    else {
        return vec![GameError::CardNotFound.into()];
    };

    let legal = match state.top_card.as_ref() {
        Some(top) => can_play_card(&state.players[player_idx].cards[card_idx], top),
        None => false,
    };
    if !legal {
        return vec![GameError::IllegalPlay.into()];
    }

    // 从手牌移除，万能牌附上选定颜色后成为新的弃牌堆顶
    let mut played = state.players[player_idx].cards.remove(card_idx);
    if played.color == CardColor::Wild {
        played.chosen_color = chosen_color;
    }
    let played_value = played.value;
    state.top_card = Some(played);

    // 打空手牌立即获胜，功能效果不再结算
    if state.players[player_idx].cards.is_empty() {
        state.status = GameStatus::Finished;
        state.winner = Some(player_id);
        return vec![
            ServerMessage::CardPlayed {
                card_id,
                player_id,
                chosen_color,
            },
            ServerMessage::GameStateSnapshot(state.clone()),
        ];
    }

    let outcome = resolve_effect(
        played_value,
        player_idx,
        state.players.len(),
        state.direction,
    );
    state.direction = outcome.direction;
    if let Some((victim_idx, count)) = outcome.forced_draw {
        let penalty = draw_from_pile(&mut state.deck, count);
        state.players[victim_idx].cards.extend(penalty);
    }
    state.set_current_player(outcome.next_idx);

    vec![
        ServerMessage::CardPlayed {
            card_id,
            player_id,
            chosen_color,
        },
        ServerMessage::GameStateSnapshot(state.clone()),
    ]
}

/// 当前玩家从牌堆摸一张牌
///
/// 摸牌不提供再出牌的机会，回合无条件沿当前方向顺延一步。
pub fn draw_card(state: &mut GameState, player_id: PlayerId) -> Vec<ServerMessage> {
    if state.status != GameStatus::Playing || state.current_player_id != Some(player_id) {
        return vec![GameError::NotYourTurn.into()];
    }
    let Some(player_idx) = state.player_index(&player_id) else {
        return vec![GameError::NotYourTurn.into()];
    };

    let drawn = draw_from_pile(&mut state.deck, 1);
    state.players[player_idx].cards.extend(drawn);

    let next = next_index(player_idx, state.players.len(), state.direction);
    state.set_current_player(next);

    vec![
        ServerMessage::CardDrawn { player_id },
        ServerMessage::GameStateSnapshot(state.clone()),
    ]
}

/// 喊 UNO：只做广播，不做任何规则惩罚
pub fn say_uno(player_id: PlayerId) -> Vec<ServerMessage> {
    vec![ServerMessage::PlayerSaidUno { player_id }]
}

/// 移除离开的玩家
///
/// 对局进行中人数跌破 2 人时，整个牌局强制回到等待状态。
/// 若离开的恰好是当前行动者，行动权交给顶上来的同位置玩家，
/// 保证 current_player_id 始终指向仍在场的人。
pub fn remove_player(state: &mut GameState, player_id: PlayerId) -> Vec<ServerMessage> {
    let Some(player_idx) = state.player_index(&player_id) else {
        return Vec::new();
    };
    let was_current = state.players[player_idx].is_current_player;
    state.players.remove(player_idx);

    if state.status == GameStatus::Playing {
        if state.players.len() < 2 {
            reset_board(state);
        } else if was_current {
            let idx = player_idx % state.players.len();
            state.set_current_player(idx);
        }
    }

    vec![
        ServerMessage::PlayerLeft { player_id },
        ServerMessage::GameStateSnapshot(state.clone()),
    ]
}

/// 重置整个对局，保留已加入的玩家
pub fn reset_game(state: &mut GameState) -> Vec<ServerMessage> {
    reset_board(state);
    vec![ServerMessage::GameStateSnapshot(state.clone())]
}

/// 把牌局字段清回等待状态（成员保留）
fn reset_board(state: &mut GameState) {
    for player in state.players.iter_mut() {
        player.cards.clear();
        player.is_current_player = false;
    }
    state.current_player_id = None;
    state.top_card = None;
    state.deck.clear();
    state.direction = Direction::Clockwise;
    state.status = GameStatus::Waiting;
    state.winner = None;
}

// --- 单元测试 ---

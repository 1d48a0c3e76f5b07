use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// --- 核心数据结构定义 ---

/// 每张牌的唯一标识
pub type CardId = Uuid;

/// 颜色 (CardColor)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Red,    // 红 🔴
    Yellow, // 黄 🟡
    Green,  // 绿 🟢
    Blue,   // 蓝 🔵
    /// 万能牌没有固有颜色，打出时再选定
    Wild,
    /// 视图脱敏用的占位颜色，不会出现在权威状态里
    Hidden,
}

/// 牌面 (CardValue)
/// 数字牌 0-9，功能牌 Skip / Reverse / Draw2，
/// 万能牌 Wild / WildDraw4
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardValue {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Skip,
    Reverse,
    Draw2,
    Wild,
    WildDraw4,
    /// 视图脱敏用的占位牌面
    Hidden,
}

/// 单张 UNO 牌 (Card)
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: CardColor,
    pub value: CardValue,
    /// 万能牌打出后选定的颜色，后续合法性判断以此为准
    pub chosen_color: Option<CardColor>,
}

impl Card {
    pub fn new(color: CardColor, value: CardValue) -> Card {
        Card {
            id: Uuid::new_v4(),
            color,
            value,
            chosen_color: None,
        }
    }

    /// 发给其他玩家的占位牌，除了"存在"之外不携带任何信息
    pub fn hidden() -> Card {
        Card {
            id: Uuid::nil(),
            color: CardColor::Hidden,
            value: CardValue::Hidden,
            chosen_color: None,
        }
    }

    /// 生效颜色：已选色的万能牌取 chosen_color，否则取固有颜色
    pub fn effective_color(&self) -> CardColor {
        match (self.color, self.chosen_color) {
            (CardColor::Wild, Some(chosen)) => chosen,
            (color, _) => color,
        }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            CardColor::Red => "🔴",
            CardColor::Yellow => "🟡",
            CardColor::Green => "🟢",
            CardColor::Blue => "🔵",
            CardColor::Wild => "🌈",
            CardColor::Hidden => "🂠",
        })
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            CardValue::Zero => "0",
            CardValue::One => "1",
            CardValue::Two => "2",
            CardValue::Three => "3",
            CardValue::Four => "4",
            CardValue::Five => "5",
            CardValue::Six => "6",
            CardValue::Seven => "7",
            CardValue::Eight => "8",
            CardValue::Nine => "9",
            CardValue::Skip => "skip",
            CardValue::Reverse => "reverse",
            CardValue::Draw2 => "+2",
            CardValue::Wild => "wild",
            CardValue::WildDraw4 => "wild+4",
            CardValue::Hidden => "?",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.chosen_color {
            Some(chosen) => write!(f, "{}{}(选{})", self.color, self.value, chosen),
            None => write!(f, "{}{}", self.color, self.value),
        }
    }
}

// --- 牌堆构建与洗牌 ---

const COLORS: [CardColor; 4] = [
    CardColor::Red,
    CardColor::Yellow,
    CardColor::Green,
    CardColor::Blue,
];

const NUMBERS: [CardValue; 9] = [
    CardValue::One,
    CardValue::Two,
    CardValue::Three,
    CardValue::Four,
    CardValue::Five,
    CardValue::Six,
    CardValue::Seven,
    CardValue::Eight,
    CardValue::Nine,
];

const ACTIONS: [CardValue; 3] = [CardValue::Skip, CardValue::Reverse, CardValue::Draw2];

/// 创建一副完整的 108 张 UNO 牌
///
/// 每种颜色一张 0、1-9 各两张（共 76 张数字牌），
/// 每种颜色 Skip/Reverse/Draw2 各两张（共 24 张功能牌），
/// 外加 Wild 和 WildDraw4 各 4 张。每张牌的 id 都是新生成的。
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(108);

    for &color in &COLORS {
        deck.push(Card::new(color, CardValue::Zero));
        for &number in &NUMBERS {
            deck.push(Card::new(color, number));
            deck.push(Card::new(color, number));
        }
        for &action in &ACTIONS {
            deck.push(Card::new(color, action));
            deck.push(Card::new(color, action));
        }
    }

    for _ in 0..4 {
        deck.push(Card::new(CardColor::Wild, CardValue::Wild));
        deck.push(Card::new(CardColor::Wild, CardValue::WildDraw4));
    }

    deck
}

/// 原地洗牌 (Fisher-Yates)
pub fn shuffle_deck(deck: &mut [Card]) {
    let mut rng = rand::rng();
    deck.shuffle(&mut rng);
}

/// 从牌堆顶抽取 count 张牌，以 Vec 末尾为牌堆顶
///
/// 牌堆抽空时直接生成一副全新的牌堆洗匀后补上
/// （弃牌历史不回收），再继续抽满所需张数。
pub fn draw_from_pile(pile: &mut Vec<Card>, count: usize) -> Vec<Card> {
    let mut cards = Vec::with_capacity(count);
    while cards.len() < count {
        match pile.pop() {
            Some(card) => cards.push(card),
            None => {
                let mut fresh = create_deck();
                shuffle_deck(&mut fresh);
                *pile = fresh;
            }
        }
    }
    cards
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_has_108_cards() {
        assert_eq!(create_deck().len(), 108);
    }

    #[test]
    fn test_deck_composition() {
        let deck = create_deck();

        // 每种颜色：1 张 0 + 18 张数字 + 6 张功能牌 = 25 张
        for color in COLORS {
            let of_color = deck.iter().filter(|c| c.color == color).count();
            assert_eq!(of_color, 25);
            let zeros = deck
                .iter()
                .filter(|c| c.color == color && c.value == CardValue::Zero)
                .count();
            assert_eq!(zeros, 1);
            for value in NUMBERS.iter().chain(ACTIONS.iter()) {
                let dup = deck
                    .iter()
                    .filter(|c| c.color == color && c.value == *value)
                    .count();
                assert_eq!(dup, 2, "{}{} 应该各有两张", color, value);
            }
        }

        // 万能牌共 8 张
        let wilds = deck.iter().filter(|c| c.value == CardValue::Wild).count();
        let wild_draw4s = deck.iter().filter(|c| c.value == CardValue::WildDraw4).count();
        assert_eq!(wilds, 4);
        assert_eq!(wild_draw4s, 4);
    }

    #[test]
    fn test_deck_ids_are_unique() {
        let deck = create_deck();
        let ids: HashSet<CardId> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), deck.len());
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut deck = create_deck();
        let mut before: Vec<CardId> = deck.iter().map(|c| c.id).collect();
        shuffle_deck(&mut deck);
        let mut after: Vec<CardId> = deck.iter().map(|c| c.id).collect();

        before.sort();
        after.sort();
        assert_eq!(before, after, "洗牌前后必须是同一组牌");
    }

    #[test]
    fn test_draw_from_pile_takes_from_top() {
        let mut pile = vec![
            Card::new(CardColor::Red, CardValue::One),
            Card::new(CardColor::Blue, CardValue::Two),
            Card::new(CardColor::Green, CardValue::Three),
        ];
        let top_id = pile[2].id;

        let drawn = draw_from_pile(&mut pile, 2);
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].id, top_id, "先抽到的应该是堆顶的牌");
        assert_eq!(pile.len(), 1);
    }

    #[test]
    fn test_draw_from_pile_refills_when_exhausted() {
        let mut pile = vec![Card::new(CardColor::Red, CardValue::One)];

        let drawn = draw_from_pile(&mut pile, 3);
        assert_eq!(drawn.len(), 3);
        // 补充的是一整副新牌，抽走 2 张后剩 106
        assert_eq!(pile.len(), 106);
    }

    #[test]
    fn test_effective_color() {
        let red = Card::new(CardColor::Red, CardValue::Five);
        assert_eq!(red.effective_color(), CardColor::Red);

        let mut wild = Card::new(CardColor::Wild, CardValue::Wild);
        assert_eq!(wild.effective_color(), CardColor::Wild);
        wild.chosen_color = Some(CardColor::Blue);
        assert_eq!(wild.effective_color(), CardColor::Blue);
    }
}

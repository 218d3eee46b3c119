use std::sync::{Arc, Mutex};

use blackjack::Rank;
use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;
use shoe_advisor::{
    AdvisorError, HandKind, LocalEngine, Slot, TurnController, TurnSession, MAX_DECKS,
};
use tokio::task::JoinHandle;

/// Suit the cards are drawn in. Purely cosmetic; the shoe only tracks ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CardStyle {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl CardStyle {
    const ALL: [CardStyle; 4] = [
        CardStyle::Hearts,
        CardStyle::Diamonds,
        CardStyle::Clubs,
        CardStyle::Spades,
    ];

    pub fn suit(self) -> char {
        match self {
            CardStyle::Hearts => '♥',
            CardStyle::Diamonds => '♦',
            CardStyle::Clubs => '♣',
            CardStyle::Spades => '♠',
        }
    }

    pub fn color(self) -> Color {
        match self {
            CardStyle::Hearts => Color::Red,
            CardStyle::Diamonds => Color::from_u32(0xFF_A5_00), // Orange
            CardStyle::Clubs => Color::Magenta,
            CardStyle::Spades => Color::Black,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CardStyle::Hearts => "Hearts",
            CardStyle::Diamonds => "Diamonds",
            CardStyle::Clubs => "Clubs",
            CardStyle::Spades => "Spades",
        }
    }

    fn cycle(self, forward: bool) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        let next = if forward { idx + 1 } else { idx + Self::ALL.len() - 1 };
        Self::ALL[next % Self::ALL.len()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Table,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    None,
    Settings,
    Help,
}

type CallTask = JoinHandle<Result<String, AdvisorError>>;

pub struct App {
    pub controller: TurnController<LocalEngine>,
    pub phase: Phase,
    pub overlay: Overlay,
    /// Deck count being edited on the setup screen or settings overlay
    pub decks: u32,
    pub style: CardStyle,
    pub focus: Slot,
    pub picker: usize,
    pub status: String,
    pub logs: Vec<String>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    pub log_visible: bool,
    tasks: Vec<CallTask>,
}

impl App {
    pub fn new(
        controller: TurnController<LocalEngine>,
        style: CardStyle,
        log_buffer: Arc<Mutex<Vec<String>>>,
    ) -> App {
        let decks = controller.config().num_decks;
        App {
            controller,
            phase: Phase::Setup,
            overlay: Overlay::None,
            decks,
            style,
            focus: Slot::Player(0),
            picker: 0,
            status: "Choose the shoe: ↑/↓ decks, ←/→ card style, [Enter] to sit down".to_string(),
            logs: vec!["Welcome to Shoe Advisor!".to_string()],
            log_buffer,
            log_visible: true,
            tasks: Vec::new(),
        }
    }

    pub fn sync_logs(&mut self) {
        let messages: Vec<String> = if let Ok(mut buffer) = self.log_buffer.lock() {
            buffer.drain(..).collect()
        } else {
            Vec::new()
        };

        for msg in messages {
            self.add_log(msg);
        }
    }

    pub fn add_log(&mut self, message: String) {
        self.logs.push(message);
        // Keep only last 20 log entries
        if self.logs.len() > 20 {
            self.logs.remove(0);
        }
    }

    /// Collect finished engine calls and surface their outcome.
    pub async fn poll_tasks(&mut self) {
        let (done, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.is_finished());
        self.tasks = pending;
        for task in done {
            match task.await {
                Ok(Ok(message)) => self.status = message,
                Ok(Err(AdvisorError::Cancelled)) => {}
                Ok(Err(err)) => self.status = err.to_string(),
                Err(err) => self.status = format!("Task failed: {err}"),
            }
        }
        for notice in self.controller.take_notices() {
            self.status = notice.to_string();
            self.add_log(notice.to_string());
        }
    }

    pub fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Every slot the cursor can visit, top to bottom. The last seen slot is
    /// always the empty one that appends.
    pub fn slots(session: &TurnSession) -> Vec<Slot> {
        let mut slots = vec![Slot::Dealer];
        slots.extend((0..session.dealer_extra.len()).map(Slot::DealerExtra));
        slots.extend((0..session.player_hand.len()).map(Slot::Player));
        slots.extend((0..=session.seen_cards.len()).map(Slot::Seen));
        slots
    }

    fn move_focus(&mut self, forward: bool) {
        let slots = Self::slots(&self.controller.session());
        let idx = slots.iter().position(|s| *s == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % slots.len()
        } else {
            (idx + slots.len() - 1) % slots.len()
        };
        self.focus = slots[next];
    }

    /// Keep the cursor on a slot that still exists after removals or a reset.
    fn clamp_focus(&mut self) {
        let slots = Self::slots(&self.controller.session());
        if !slots.contains(&self.focus) {
            self.focus = match self.focus {
                Slot::Seen(_) => slots.last().copied().unwrap_or(Slot::Dealer),
                _ => Slot::Player(0),
            };
        }
    }

    fn place(&mut self, rank: Rank) {
        if self.controller.place_card(self.focus, rank) {
            if let Slot::Seen(_) = self.focus {
                // Stay on the append slot so seen cards can be keyed in a row
                let len = self.controller.session().seen_cards.len();
                self.focus = Slot::Seen(len);
            } else {
                self.move_focus(true);
            }
            self.status = format!("Placed {rank}");
        } else {
            self.status = format!("No {rank} left in the shoe");
        }
    }

    fn remove(&mut self) {
        if self.controller.remove_card(self.focus) {
            self.status = "Card removed".to_string();
            self.clamp_focus();
        } else {
            self.status = "That slot can only be replaced".to_string();
        }
    }

    fn request_advice(&mut self) {
        if !self.controller.can_request_advice() {
            self.status = if self.is_busy() {
                AdvisorError::Busy.to_string()
            } else {
                AdvisorError::IncompleteHand.to_string()
            };
            return;
        }
        let controller = self.controller.clone();
        self.status = "Calculating...".to_string();
        self.tasks.push(tokio::spawn(async move {
            let advice = controller.request_advice().await?;
            Ok(format!(
                "{} (win {}, loss {})",
                advice.recommended, advice.win_display, advice.loss_display
            ))
        }));
    }

    fn advance_turn(&mut self) {
        let controller = self.controller.clone();
        self.tasks.push(tokio::spawn(async move {
            controller.advance_turn().await?;
            Ok("Next turn: place the new cards".to_string())
        }));
    }

    fn reshuffle(&mut self) {
        let controller = self.controller.clone();
        let decks = self.decks;
        self.focus = Slot::Player(0);
        self.tasks.push(tokio::spawn(async move {
            controller.reshuffle(decks).await?;
            Ok(format!("Shuffled a fresh shoe of {decks} deck(s)"))
        }));
    }

    fn adjust_decks(&mut self, up: bool) {
        self.decks = if up {
            (self.decks + 1).min(MAX_DECKS)
        } else {
            self.decks.saturating_sub(1).max(1)
        };
    }

    /// Returns false when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match (self.phase, self.overlay) {
            (Phase::Setup, _) => self.handle_setup_key(key.code),
            (Phase::Table, Overlay::Settings) => {
                self.handle_settings_key(key.code);
                true
            }
            (Phase::Table, Overlay::Help) => {
                self.overlay = Overlay::None;
                true
            }
            (Phase::Table, Overlay::None) => self.handle_table_key(key.code),
        }
    }

    fn handle_setup_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => return false,
            KeyCode::Up => self.adjust_decks(true),
            KeyCode::Down => self.adjust_decks(false),
            KeyCode::Left => self.style = self.style.cycle(false),
            KeyCode::Right => self.style = self.style.cycle(true),
            KeyCode::Enter => {
                self.phase = Phase::Table;
                self.reshuffle();
                self.status = "Place your cards. [h] for help".to_string();
            }
            _ => {}
        }
        true
    }

    fn handle_settings_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.overlay = Overlay::None,
            KeyCode::Up => self.adjust_decks(true),
            KeyCode::Down => self.adjust_decks(false),
            KeyCode::Left => self.style = self.style.cycle(false),
            KeyCode::Right => self.style = self.style.cycle(true),
            KeyCode::Enter => {
                self.overlay = Overlay::None;
                self.reshuffle();
            }
            _ => {}
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) -> bool {
        if let Some(rank) = rank_for_key(code) {
            self.place(rank);
            return true;
        }
        match code {
            KeyCode::Esc => return false,
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Left => self.picker = (self.picker + Rank::ALL.len() - 1) % Rank::ALL.len(),
            KeyCode::Right => self.picker = (self.picker + 1) % Rank::ALL.len(),
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                if let Some(rank) = Rank::from_index(self.picker) {
                    self.place(rank);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => self.remove(),
            KeyCode::Char('+') => {
                self.focus = self.controller.add_hand_slot(HandKind::Player);
            }
            KeyCode::Char('d') => {
                self.focus = self.controller.add_hand_slot(HandKind::Dealer);
            }
            KeyCode::Enter | KeyCode::Char('c') => self.request_advice(),
            KeyCode::Char('n') => {
                if self.controller.session().last_advice.is_some() {
                    self.advance_turn();
                    self.focus = Slot::Player(0);
                } else {
                    self.status = AdvisorError::NoAdvice.to_string();
                }
            }
            KeyCode::Char('s') => {
                self.decks = self.controller.mirror().num_decks();
                self.overlay = Overlay::Settings;
            }
            KeyCode::Char('h') => self.overlay = Overlay::Help,
            KeyCode::Char('l') => self.log_visible = !self.log_visible,
            _ => {}
        }
        true
    }
}

/// a, 2-9, t or 0, j, q, k
fn rank_for_key(code: KeyCode) -> Option<Rank> {
    match code {
        KeyCode::Char('a') => Some(Rank::Ace),
        KeyCode::Char('t') | KeyCode::Char('0') => Some(Rank::Ten),
        KeyCode::Char('j') => Some(Rank::Jack),
        KeyCode::Char('q') => Some(Rank::Queen),
        KeyCode::Char('k') => Some(Rank::King),
        KeyCode::Char(c @ '2'..='9') => c.to_string().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_keys() {
        assert_eq!(rank_for_key(KeyCode::Char('a')), Some(Rank::Ace));
        assert_eq!(rank_for_key(KeyCode::Char('7')), Some(Rank::Seven));
        assert_eq!(rank_for_key(KeyCode::Char('0')), Some(Rank::Ten));
        assert_eq!(rank_for_key(KeyCode::Char('q')), Some(Rank::Queen));
        assert_eq!(rank_for_key(KeyCode::Char('1')), None);
        assert_eq!(rank_for_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_style_cycles_both_ways() {
        assert_eq!(CardStyle::Hearts.cycle(true), CardStyle::Diamonds);
        assert_eq!(CardStyle::Hearts.cycle(false), CardStyle::Spades);
        assert_eq!(CardStyle::Spades.cycle(true), CardStyle::Hearts);
    }

    #[test]
    fn test_slot_order_ends_with_append_slot() {
        let mut session = TurnSession::new();
        session.dealer_extra.push(None);
        session.seen_cards.push(Rank::Two);
        assert_eq!(
            App::slots(&session),
            vec![
                Slot::Dealer,
                Slot::DealerExtra(0),
                Slot::Player(0),
                Slot::Player(1),
                Slot::Seen(0),
                Slot::Seen(1),
            ]
        );
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    // Control
    StartPause, // Space - start monitoring, then pause/resume
    Quit,       // 'q', Esc or Ctrl+C

    // View modes (live in every state)
    SwitchView,  // 'v' - horizontal <-> vertical
    ToggleCrawl, // 'n' - novelty crawl mode

    // Option adjustments (start screen only)
    FasterSampling,  // '+' - decrease sample interval
    SlowerSampling,  // '-' - increase sample interval
    FasterDisplay,   // '>' - decrease display interval
    SlowerDisplay,   // '<' - increase display interval
    ToggleCompact,   // 'c'
    ToggleAnimate,   // 'a'
    TogglePixel,     // 'p'
    ToggleSparkline, // 'o'
    CycleBackground, // 'b'

    // Unknown/unhandled
    Unknown,
}

impl InputEvent {
    #[must_use]
    pub fn from_key_event(key_event: KeyEvent) -> Self {
        if key_event.code == KeyCode::Char('c')
            && key_event.modifiers.contains(KeyModifiers::CONTROL)
        {
            return Self::Quit;
        }

        match key_event.code {
            KeyCode::Char(' ') => Self::StartPause,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,

            KeyCode::Char('v') => Self::SwitchView,
            KeyCode::Char('n') => Self::ToggleCrawl,

            KeyCode::Char('+') => Self::FasterSampling,
            KeyCode::Char('-') => Self::SlowerSampling,
            KeyCode::Char('>') => Self::FasterDisplay,
            KeyCode::Char('<') => Self::SlowerDisplay,
            KeyCode::Char('c') => Self::ToggleCompact,
            KeyCode::Char('a') => Self::ToggleAnimate,
            KeyCode::Char('p') => Self::TogglePixel,
            KeyCode::Char('o') => Self::ToggleSparkline,
            KeyCode::Char('b') => Self::CycleBackground,

            _ => Self::Unknown,
        }
    }
}

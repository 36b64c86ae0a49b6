/// Color (RGBA, 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Filler used for shadows.
    pub const SHADOW: Self = Self::new(0, 0, 0, 128);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Unit action, shared by animation tables and object commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Action {
    #[default]
    Stand = 0,
    Build = 1,
    Go = 2,
    StartMove = 3,
    RotateLeft = 4,
    RotateRight = 5,
    Open = 6,
    Close = 7,
    Fight = 8,
    Salut = 9,
    StandOpen = 10,
    Load = 11,
    Unload = 12,
    Wound = 13,
    Birth = 14,
    Death = 15,
}

impl Action {
    pub const COUNT: usize = 16;

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Stand),
            1 => Some(Self::Build),
            2 => Some(Self::Go),
            3 => Some(Self::StartMove),
            4 => Some(Self::RotateLeft),
            5 => Some(Self::RotateRight),
            6 => Some(Self::Open),
            7 => Some(Self::Close),
            8 => Some(Self::Fight),
            9 => Some(Self::Salut),
            10 => Some(Self::StandOpen),
            11 => Some(Self::Load),
            12 => Some(Self::Unload),
            13 => Some(Self::Wound),
            14 => Some(Self::Birth),
            15 => Some(Self::Death),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Stand => "stand",
            Self::Build => "build",
            Self::Go => "go",
            Self::StartMove => "start_move",
            Self::RotateLeft => "rotate_left",
            Self::RotateRight => "rotate_right",
            Self::Open => "open",
            Self::Close => "close",
            Self::Fight => "fight",
            Self::Salut => "salut",
            Self::StandOpen => "stand_open",
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Wound => "wound",
            Self::Birth => "birth",
            Self::Death => "death",
        }
    }
}

/// Axis-aligned bounds in map coordinates, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min_x: i16,
    pub min_y: i16,
    pub max_x: i16,
    pub max_y: i16,
}

impl Bounds {
    pub fn point(x: i16, y: i16) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    /// Tightest bounds around all points, `None` when there are none.
    pub fn around(points: impl IntoIterator<Item = (i16, i16)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::point(x, y),
                Some(b) => b.include(x, y),
            })
        })
    }

    pub fn include(self, x: i16, y: i16) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
        }
    }
}

//! Perceptual category classifiers over HSL.
//!
//! Each classifier is a fixed decision tree over hue (degrees), saturation
//! and lightness (percent). The band edges are empirical and may be retuned;
//! the category vocabularies are part of the output contract and are not.

use serde::Serialize;

macro_rules! labels {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use labels;

labels! {
    /// Eye color categories.
    EyeCategory {
        Black => "black",
        Gray => "gray",
        DarkBrown => "dark brown",
        LightBrown => "light brown",
        Brown => "brown",
        DarkBlue => "dark blue",
        Blue => "blue",
        LightBlue => "light blue",
        Hazel => "hazel",
        Green => "green",
        AmberHazel => "amber/hazel",
    }
}

labels! {
    /// Hair color categories.
    HairCategory {
        Black => "black",
        WhiteGray => "white/gray",
        Gray => "gray",
        Blonde => "blonde",
        StrawberryBlonde => "strawberry blonde",
        RedAuburn => "red/auburn",
        DarkBrown => "dark brown",
        Brown => "brown",
        LightBrown => "light brown",
    }
}

labels! {
    /// Skin tone bands, lightest first.
    SkinToneCategory {
        VeryFair => "very fair",
        Fair => "fair",
        Medium => "medium",
        OliveTan => "olive/tan",
        Brown => "brown",
        DarkBrown => "dark brown",
    }
}

labels! {
    /// Skin undertone derived from hue.
    Undertone {
        Warm => "warm",
        NeutralWarm => "neutral-warm",
        Cool => "cool",
        Neutral => "neutral",
    }
}

labels! {
    /// Fitzpatrick scale label. Descriptive only.
    Fitzpatrick {
        TypeI => "Type I",
        TypeII => "Type II",
        TypeIII => "Type III",
        TypeIV => "Type IV",
        TypeV => "Type V",
        TypeVI => "Type VI",
    }
}

pub fn classify_eye_color(h: f32, s: f32, l: f32) -> EyeCategory {
    if l < 20.0 {
        return EyeCategory::Black;
    }
    if (l > 70.0 && s < 20.0) || (s < 15.0 && l > 40.0) {
        return EyeCategory::Gray;
    }

    if s < 30.0 {
        return if l < 40.0 {
            EyeCategory::DarkBrown
        } else {
            EyeCategory::LightBrown
        };
    }

    if (180.0..=250.0).contains(&h) {
        return if l < 40.0 {
            EyeCategory::DarkBlue
        } else if l > 60.0 {
            EyeCategory::LightBlue
        } else {
            EyeCategory::Blue
        };
    }

    if (70.0..=170.0).contains(&h) {
        return if s < 40.0 {
            EyeCategory::Hazel
        } else {
            EyeCategory::Green
        };
    }

    if (30.0..=70.0).contains(&h) {
        return EyeCategory::AmberHazel;
    }

    EyeCategory::Brown
}

pub fn classify_hair_color(h: f32, s: f32, l: f32) -> HairCategory {
    if l < 15.0 {
        return HairCategory::Black;
    }
    if l > 80.0 && s < 20.0 {
        return HairCategory::WhiteGray;
    }
    if l > 65.0 && s < 30.0 {
        return HairCategory::Gray;
    }

    if l > 55.0 {
        return if (30.0..=60.0).contains(&h) {
            HairCategory::Blonde
        } else if (20.0..30.0).contains(&h) {
            HairCategory::StrawberryBlonde
        } else {
            HairCategory::LightBrown
        };
    }

    let reddish = (0.0..=30.0).contains(&h) || (350.0..=360.0).contains(&h);
    if reddish && s > 30.0 {
        return HairCategory::RedAuburn;
    }

    if l < 25.0 {
        HairCategory::DarkBrown
    } else if l < 40.0 {
        HairCategory::Brown
    } else {
        HairCategory::LightBrown
    }
}

/// Skin tone, undertone and Fitzpatrick label for one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkinTone {
    pub tone: SkinToneCategory,
    pub undertone: Undertone,
    pub fitzpatrick: Fitzpatrick,
}

pub fn classify_skin_tone(h: f32, _s: f32, l: f32) -> SkinTone {
    let (tone, fitzpatrick) = if l > 80.0 {
        (SkinToneCategory::VeryFair, Fitzpatrick::TypeI)
    } else if l > 70.0 {
        (SkinToneCategory::Fair, Fitzpatrick::TypeII)
    } else if l > 55.0 {
        (SkinToneCategory::Medium, Fitzpatrick::TypeIII)
    } else if l > 40.0 {
        (SkinToneCategory::OliveTan, Fitzpatrick::TypeIV)
    } else if l > 25.0 {
        (SkinToneCategory::Brown, Fitzpatrick::TypeV)
    } else {
        (SkinToneCategory::DarkBrown, Fitzpatrick::TypeVI)
    };

    let undertone = if (0.0..=20.0).contains(&h) {
        Undertone::Warm
    } else if (20.0..=40.0).contains(&h) {
        Undertone::NeutralWarm
    } else if (330.0..=360.0).contains(&h) {
        Undertone::Cool
    } else {
        Undertone::Neutral
    };

    SkinTone {
        tone,
        undertone,
        fitzpatrick,
    }
}

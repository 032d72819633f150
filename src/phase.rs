// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use crate::error::{AnisoError, Result};
use crate::kernels::WaveMode;
use crate::mesh::Region;

/// A propagation mode within one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhasePart {
    /// P wave in the mantle.
    P,
    /// SV wave in the mantle.
    SV,
    /// SH wave in the mantle.
    SH,
    /// P wave in the outer core.
    K,
    /// P wave in the inner core.
    I,
    /// SV wave in the inner core.
    JV,
    /// SH wave in the inner core.
    JH,
}

impl PhasePart {
    /// Every part, in index order.
    pub const ALL: [PhasePart; 7] = [
        PhasePart::P,
        PhasePart::SV,
        PhasePart::SH,
        PhasePart::K,
        PhasePart::I,
        PhasePart::JV,
        PhasePart::JH,
    ];

    /// Position of the part in [`PhasePart::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Region the part propagates in.
    pub fn region(self) -> Region {
        match self {
            PhasePart::P | PhasePart::SV | PhasePart::SH => Region::Mantle,
            PhasePart::K => Region::OuterCore,
            PhasePart::I | PhasePart::JV | PhasePart::JH => Region::InnerCore,
        }
    }

    /// Wave mode used for the vertical slowness.
    pub fn mode(self) -> WaveMode {
        match self {
            PhasePart::P | PhasePart::K | PhasePart::I => WaveMode::P,
            PhasePart::SV | PhasePart::JV => WaveMode::SV,
            PhasePart::SH | PhasePart::JH => WaveMode::SH,
        }
    }

    fn is_compressional(self) -> bool {
        self.mode() == WaveMode::P
    }
}

/// Vertical direction of travel along a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the centre.
    Down,
    /// Towards the surface.
    Up,
}

/// What the deep end of a leg touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reach {
    /// The turning radius of the part.
    Turning,
    /// The inner boundary of the region, where the ray is reflected or transmitted.
    Boundary,
    /// The source; only the first, up-going leg of a depth phase.
    Source,
}

/// One single-mode segment of a phase between two radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leg {
    /// Mode and region.
    pub part: PhasePart,
    /// Direction of travel.
    pub direction: Direction,
    /// Deep end of the leg.
    pub reach: Reach,
}

impl Leg {
    /// Create a leg.
    pub fn new(part: PhasePart, direction: Direction, reach: Reach) -> Self {
        Leg {
            part,
            direction,
            reach,
        }
    }
}

/// Polarization of the shear legs of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// P-SV system.
    Psv,
    /// SH system.
    Sh,
}

/// A seismic phase: an ordered sequence of legs, optionally diffracted along
/// the core-mantle boundary.
///
/// Two phases are equal when their legs and diffraction angles are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    legs: Vec<Leg>,
    diffraction: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    None,
    V,
    H,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Symbol {
    P,
    S(Mark),
    K,
    I,
    J,
    Cmb,
    Icb,
    DepthP,
    DepthS(Mark),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |m: &Mark| match m {
            Mark::None => "",
            Mark::V => "V",
            Mark::H => "H",
        };
        match self {
            Symbol::P => write!(f, "P"),
            Symbol::S(m) => write!(f, "S{}", mark(m)),
            Symbol::K => write!(f, "K"),
            Symbol::I => write!(f, "I"),
            Symbol::J => write!(f, "J"),
            Symbol::Cmb => write!(f, "c"),
            Symbol::Icb => write!(f, "i"),
            Symbol::DepthP => write!(f, "p"),
            Symbol::DepthS(m) => write!(f, "s{}", mark(m)),
        }
    }
}

/// Where the ray is after the symbols read so far.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
    Surface,
    CmbFromAbove,
    CmbReflected,
    CmbFromBelow,
    IcbFromAbove,
    IcbReflected,
    IcbFromBelow,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::Surface => "the surface",
            Position::CmbFromAbove => "the top of the core-mantle boundary",
            Position::CmbReflected => "a core-mantle boundary reflection",
            Position::CmbFromBelow => "the underside of the core-mantle boundary",
            Position::IcbFromAbove => "the top of the inner-core boundary",
            Position::IcbReflected => "an inner-core boundary reflection",
            Position::IcbFromBelow => "the underside of the inner-core boundary",
        };
        write!(f, "{}", s)
    }
}

fn tokenize(name: &str) -> Result<(Vec<Symbol>, Option<f64>)> {
    let err = |reason: String| AnisoError::PhaseParse {
        name: name.to_string(),
        reason,
    };
    if !name.is_ascii() {
        return Err(err("non-ASCII characters".to_string()));
    }
    let bytes = name.as_bytes();
    let mut symbols = Vec::new();
    let mut diffraction = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'S' | b's' => {
                let mark = match bytes.get(i + 1) {
                    Some(b'V') => Mark::V,
                    Some(b'H') => Mark::H,
                    _ => Mark::None,
                };
                if mark != Mark::None {
                    i += 1;
                }
                symbols.push(if c == b'S' {
                    Symbol::S(mark)
                } else {
                    Symbol::DepthS(mark)
                });
            }
            b'P' => symbols.push(Symbol::P),
            b'p' => symbols.push(Symbol::DepthP),
            b'K' => symbols.push(Symbol::K),
            b'I' => symbols.push(Symbol::I),
            b'J' => symbols.push(Symbol::J),
            b'c' => symbols.push(Symbol::Cmb),
            b'i' => symbols.push(Symbol::Icb),
            b'd' | b'0'..=b'9' | b'.' => {
                let rest = &name[i..];
                let angle = rest.strip_prefix("diff").unwrap_or(rest);
                if c == b'd' && angle.len() == rest.len() {
                    return Err(err(format!("unknown symbol '{}'", rest)));
                }
                diffraction = Some(parse_angle(angle).map_err(err)?);
                break;
            }
            other => return Err(err(format!("unknown symbol '{}'", other as char))),
        }
        i += 1;
    }
    if symbols.is_empty() {
        return Err(err("empty phase".to_string()));
    }
    if diffraction.is_some() && !matches!(symbols.as_slice(), [Symbol::P] | [Symbol::S(_)]) {
        return Err(err(
            "only a single P or S mantle leg can be diffracted".to_string(),
        ));
    }
    Ok((symbols, diffraction))
}

fn parse_angle(s: &str) -> std::result::Result<f64, String> {
    if s.is_empty() {
        return Ok(0.0);
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(format!("invalid diffraction angle '{}'", s));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid diffraction angle '{}'", s)),
    }
}

fn resolve_polarity(name: &str, symbols: &[Symbol], default: Polarity) -> Result<Polarity> {
    let compressional = symbols
        .iter()
        .any(|s| matches!(s, Symbol::P | Symbol::K | Symbol::I | Symbol::DepthP));
    let marks: Vec<Mark> = symbols
        .iter()
        .filter_map(|s| match s {
            Symbol::S(m) | Symbol::DepthS(m) => Some(*m),
            Symbol::J => Some(Mark::None),
            _ => None,
        })
        .collect();
    if marks.is_empty() {
        return Ok(Polarity::Psv);
    }
    let has_v = marks.contains(&Mark::V);
    let has_h = marks.contains(&Mark::H);
    if compressional {
        if has_h {
            return Err(AnisoError::PhaseParse {
                name: name.to_string(),
                reason: "SH cannot convert to or from P".to_string(),
            });
        }
        return Ok(Polarity::Psv);
    }
    match (has_v, has_h) {
        (true, true) => Err(AnisoError::PhaseParse {
            name: name.to_string(),
            reason: "mixed SV and SH marks".to_string(),
        }),
        (true, false) => Ok(Polarity::Psv),
        (false, true) => Ok(Polarity::Sh),
        (false, false) => Ok(default),
    }
}

fn build_legs(name: &str, symbols: &[Symbol], polarity: Polarity) -> Result<Vec<Leg>> {
    use Direction::{Down, Up};
    use Reach::{Boundary, Source, Turning};

    let err = |reason: String| AnisoError::PhaseParse {
        name: name.to_string(),
        reason,
    };
    let (shear, inner_shear) = match polarity {
        Polarity::Psv => (PhasePart::SV, PhasePart::JV),
        Polarity::Sh => (PhasePart::SH, PhasePart::JH),
    };
    let mantle_part = |s: Symbol| match s {
        Symbol::P | Symbol::DepthP => PhasePart::P,
        _ => shear,
    };

    let mut legs = Vec::with_capacity(2 * symbols.len());
    let mut pos = Position::Surface;
    for (k, &sym) in symbols.iter().enumerate() {
        let next = symbols.get(k + 1).copied();
        match sym {
            Symbol::DepthP | Symbol::DepthS(_) => {
                if k != 0 {
                    return Err(err(format!("'{}' can only start a phase", sym)));
                }
                legs.push(Leg::new(mantle_part(sym), Up, Source));
            }
            Symbol::P | Symbol::S(_) => {
                let part = mantle_part(sym);
                match pos {
                    Position::Surface => match next {
                        None | Some(Symbol::P) | Some(Symbol::S(_)) => {
                            legs.push(Leg::new(part, Down, Turning));
                            legs.push(Leg::new(part, Up, Turning));
                        }
                        Some(Symbol::Cmb) | Some(Symbol::K) => {
                            legs.push(Leg::new(part, Down, Boundary));
                            pos = Position::CmbFromAbove;
                        }
                        Some(other) => {
                            return Err(err(format!(
                                "'{}' cannot follow a mantle leg from the surface",
                                other
                            )))
                        }
                    },
                    Position::CmbReflected | Position::CmbFromBelow => {
                        legs.push(Leg::new(part, Up, Boundary));
                        pos = Position::Surface;
                    }
                    _ => return Err(err(format!("'{}' cannot start at {}", sym, pos))),
                }
            }
            Symbol::K => match pos {
                Position::CmbFromAbove | Position::CmbFromBelow => match next {
                    Some(Symbol::P) | Some(Symbol::S(_)) | Some(Symbol::K) => {
                        legs.push(Leg::new(PhasePart::K, Down, Turning));
                        legs.push(Leg::new(PhasePart::K, Up, Turning));
                        pos = Position::CmbFromBelow;
                    }
                    Some(Symbol::Icb) | Some(Symbol::I) | Some(Symbol::J) => {
                        legs.push(Leg::new(PhasePart::K, Down, Boundary));
                        pos = Position::IcbFromAbove;
                    }
                    None => return Err(err("phase must end with a mantle leg".to_string())),
                    Some(other) => return Err(err(format!("'{}' cannot follow 'K'", other))),
                },
                Position::IcbReflected | Position::IcbFromBelow => {
                    legs.push(Leg::new(PhasePart::K, Up, Boundary));
                    pos = Position::CmbFromBelow;
                }
                _ => return Err(err(format!("'K' cannot start at {}", pos))),
            },
            Symbol::I | Symbol::J => match pos {
                Position::IcbFromAbove | Position::IcbFromBelow => {
                    let part = if sym == Symbol::I {
                        PhasePart::I
                    } else {
                        inner_shear
                    };
                    legs.push(Leg::new(part, Down, Turning));
                    legs.push(Leg::new(part, Up, Turning));
                    pos = Position::IcbFromBelow;
                }
                _ => return Err(err(format!("'{}' cannot start at {}", sym, pos))),
            },
            Symbol::Cmb => {
                if pos != Position::CmbFromAbove {
                    return Err(err(format!("'c' cannot occur at {}", pos)));
                }
                pos = Position::CmbReflected;
            }
            Symbol::Icb => {
                if pos != Position::IcbFromAbove {
                    return Err(err(format!("'i' cannot occur at {}", pos)));
                }
                pos = Position::IcbReflected;
            }
        }
    }
    if pos != Position::Surface {
        return Err(err(format!("phase ends at {} instead of the surface", pos)));
    }
    Ok(legs)
}

impl Phase {
    /// Parse a phase name. Pure-shear phases without marks are SH.
    ///
    /// # Errors
    /// Returns [`AnisoError::PhaseParse`] for unknown symbols or impossible paths.
    pub fn parse(name: &str) -> Result<Self> {
        Self::parse_with(name, Polarity::Sh)
    }

    /// Parse a phase name, using `default` for pure-shear phases without
    /// explicit `SV`/`SH` marks. Phases with P legs are always P-SV.
    ///
    /// # Errors
    /// Returns [`AnisoError::PhaseParse`] for unknown symbols or impossible paths.
    pub fn parse_with(name: &str, default: Polarity) -> Result<Self> {
        let (symbols, diffraction) = tokenize(name)?;
        let polarity = resolve_polarity(name, &symbols, default)?;
        let legs = build_legs(name, &symbols, polarity)?;
        Ok(Phase { legs, diffraction })
    }

    fn turning(part: PhasePart) -> Self {
        Phase {
            legs: vec![
                Leg::new(part, Direction::Down, Reach::Turning),
                Leg::new(part, Direction::Up, Reach::Turning),
            ],
            diffraction: None,
        }
    }

    /// Direct P.
    pub fn p() -> Self {
        Self::turning(PhasePart::P)
    }

    /// Direct S (SH).
    pub fn s() -> Self {
        Self::turning(PhasePart::SH)
    }

    /// P diffracted along the core-mantle boundary by `angle` degrees.
    pub fn pdiff(angle: f64) -> Self {
        Self::p().with_diffraction(angle)
    }

    /// P reflected at the core-mantle boundary.
    pub fn pcp() -> Self {
        use Direction::{Down, Up};
        Phase {
            legs: vec![
                Leg::new(PhasePart::P, Down, Reach::Boundary),
                Leg::new(PhasePart::P, Up, Reach::Boundary),
            ],
            diffraction: None,
        }
    }

    /// P through the outer and inner core.
    pub fn pkikp() -> Self {
        use Direction::{Down, Up};
        use Reach::{Boundary, Turning};
        Phase {
            legs: vec![
                Leg::new(PhasePart::P, Down, Boundary),
                Leg::new(PhasePart::K, Down, Boundary),
                Leg::new(PhasePart::I, Down, Turning),
                Leg::new(PhasePart::I, Up, Turning),
                Leg::new(PhasePart::K, Up, Boundary),
                Leg::new(PhasePart::P, Up, Boundary),
            ],
            diffraction: None,
        }
    }

    /// The legs, in order of travel.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Diffraction angle in degrees, if the phase is diffracted.
    pub fn diffraction(&self) -> Option<f64> {
        self.diffraction
    }

    /// Whether the phase travels along the core-mantle boundary.
    pub fn is_diffracted(&self) -> bool {
        self.diffraction.is_some()
    }

    /// The same path diffracted by `angle` degrees.
    pub fn with_diffraction(&self, angle: f64) -> Self {
        Phase {
            legs: self.legs.clone(),
            diffraction: Some(angle),
        }
    }

    /// The same path without diffraction.
    pub fn without_diffraction(&self) -> Self {
        Phase {
            legs: self.legs.clone(),
            diffraction: None,
        }
    }

    /// SH when any leg is SH, otherwise P-SV.
    pub fn polarity(&self) -> Polarity {
        if self
            .legs
            .iter()
            .any(|l| matches!(l.part, PhasePart::SH | PhasePart::JH))
        {
            Polarity::Sh
        } else {
            Polarity::Psv
        }
    }

    /// Whether the phase starts upward from the source.
    pub fn is_depth_phase(&self) -> bool {
        self.legs.first().map(|l| l.reach) == Some(Reach::Source)
    }
}

impl FromStr for Phase {
    type Err = AnisoError;

    fn from_str(s: &str) -> Result<Self> {
        Phase::parse(s)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pure_sv = self.legs.iter().all(|l| !l.part.is_compressional())
            && self.legs.iter().any(|l| l.part == PhasePart::SV);
        let letter = |part: PhasePart| match part {
            PhasePart::P => "P",
            PhasePart::SV if pure_sv => "SV",
            PhasePart::SV | PhasePart::SH => "S",
            PhasePart::K => "K",
            PhasePart::I => "I",
            PhasePart::JV | PhasePart::JH => "J",
        };

        let mut k = 0;
        while k < self.legs.len() {
            let leg = self.legs[k];
            match (leg.direction, leg.reach) {
                (Direction::Up, Reach::Source) => {
                    let s = match leg.part {
                        PhasePart::P => "p",
                        _ if pure_sv => "sV",
                        _ => "s",
                    };
                    write!(f, "{}", s)?;
                    k += 1;
                }
                (Direction::Down, Reach::Turning) => {
                    write!(f, "{}", letter(leg.part))?;
                    k += 2;
                }
                (Direction::Down, _) => {
                    write!(f, "{}", letter(leg.part))?;
                    if let Some(next) = self.legs.get(k + 1) {
                        if next.direction == Direction::Up
                            && next.reach == Reach::Boundary
                            && next.part.region() == leg.part.region()
                        {
                            let reflection = if leg.part.region() == Region::Mantle {
                                "c"
                            } else {
                                "i"
                            };
                            write!(f, "{}", reflection)?;
                        }
                    }
                    k += 1;
                }
                (Direction::Up, _) => {
                    write!(f, "{}", letter(leg.part))?;
                    k += 1;
                }
            }
        }
        if let Some(angle) = self.diffraction {
            write!(f, "diff")?;
            if angle != 0.0 {
                write!(f, "{}", angle)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::{Down, Up};
    use Reach::{Boundary, Source, Turning};

    fn legs(name: &str) -> Vec<Leg> {
        Phase::parse(name).unwrap().legs().to_vec()
    }

    #[test]
    fn direct_phases() {
        assert_eq!(
            legs("P"),
            vec![
                Leg::new(PhasePart::P, Down, Turning),
                Leg::new(PhasePart::P, Up, Turning)
            ]
        );
        assert_eq!(Phase::parse("S").unwrap(), Phase::s());
        assert_eq!(Phase::parse("P").unwrap(), Phase::p());
        assert_eq!(legs("PP").len(), 4);
    }

    #[test]
    fn core_phases() {
        assert_eq!(Phase::parse("PcP").unwrap(), Phase::pcp());
        assert_eq!(Phase::parse("PKIKP").unwrap(), Phase::pkikp());
        assert_eq!(
            legs("PKiKP"),
            vec![
                Leg::new(PhasePart::P, Down, Boundary),
                Leg::new(PhasePart::K, Down, Boundary),
                Leg::new(PhasePart::K, Up, Boundary),
                Leg::new(PhasePart::P, Up, Boundary),
            ]
        );
        assert_eq!(
            legs("PKKP"),
            vec![
                Leg::new(PhasePart::P, Down, Boundary),
                Leg::new(PhasePart::K, Down, Turning),
                Leg::new(PhasePart::K, Up, Turning),
                Leg::new(PhasePart::K, Down, Turning),
                Leg::new(PhasePart::K, Up, Turning),
                Leg::new(PhasePart::P, Up, Boundary),
            ]
        );
        let pkjkp = legs("PKJKP");
        assert_eq!(pkjkp[2].part, PhasePart::JV);
        assert_eq!(pkjkp[3].part, PhasePart::JV);
    }

    #[test]
    fn depth_phases() {
        assert_eq!(
            legs("pP"),
            vec![
                Leg::new(PhasePart::P, Up, Source),
                Leg::new(PhasePart::P, Down, Turning),
                Leg::new(PhasePart::P, Up, Turning),
            ]
        );
        assert_eq!(legs("sS")[0].part, PhasePart::SH);
        assert_eq!(legs("sP")[0].part, PhasePart::SV);
        assert!(Phase::parse("pP").unwrap().is_depth_phase());
        assert!(Phase::parse("Pp").is_err());
    }

    #[test]
    fn polarity() {
        assert_eq!(legs("ScS")[0].part, PhasePart::SH);
        assert_eq!(legs("SVcSV")[0].part, PhasePart::SV);
        assert_eq!(legs("ScP")[0].part, PhasePart::SV);
        assert_eq!(legs("SKS")[0].part, PhasePart::SV);
        assert_eq!(
            Phase::parse_with("ScS", Polarity::Psv).unwrap().legs()[0].part,
            PhasePart::SV
        );
        assert_eq!(Phase::parse("SHcSH").unwrap(), Phase::parse("ScS").unwrap());
        assert_eq!(Phase::parse("ScS").unwrap().polarity(), Polarity::Sh);
        assert_eq!(Phase::parse("PKIKP").unwrap().polarity(), Polarity::Psv);
    }

    #[test]
    fn polarity_errors() {
        assert!(Phase::parse("SHcP").is_err());
        assert!(Phase::parse("SVcSH").is_err());
        assert!(Phase::parse("SHKS").is_err());
    }

    #[test]
    fn diffraction() {
        let p = Phase::parse("Pdiff").unwrap();
        assert_eq!(p.diffraction(), Some(0.0));
        assert_eq!(p, Phase::pdiff(0.0));
        assert_eq!(Phase::parse("P10").unwrap(), Phase::parse("Pdiff10").unwrap());
        assert_eq!(Phase::parse("Sdiff2.5").unwrap().diffraction(), Some(2.5));
        assert_eq!(Phase::parse("SVdiff").unwrap().legs()[0].part, PhasePart::SV);
        assert_ne!(Phase::parse("Pdiff").unwrap(), Phase::p());
        assert!(Phase::parse("PcPdiff").is_err());
        assert!(Phase::parse("PKPdiff").is_err());
        assert!(Phase::parse("Pdiffx").is_err());
        assert!(Phase::parse("Pdiff1.2.3").is_err());
        assert!(Phase::parse("10").is_err());
        assert!(Phase::parse("Pd").is_err());
    }

    #[test]
    fn invalid_names() {
        for name in [
            "", "X", "PKP ", "K", "PK", "PcK", "Pc", "PcI", "PKc", "PiP", "PI", "PKIK", "cP",
            "PKIKPi", "PKiP", "Pé",
        ] {
            let result = Phase::parse(name);
            assert!(
                matches!(result, Err(AnisoError::PhaseParse { .. })),
                "'{}' should not parse",
                name
            );
        }
    }

    #[test]
    fn display_round_trip() {
        for name in [
            "P", "S", "PP", "SS", "PcP", "ScS", "ScP", "PcS", "PKP", "PKKP", "PKiKP", "PKIKP",
            "PKIIKP", "PKJKP", "SKS", "SKKS", "SKIKS", "pP", "sS", "sP", "pPKIKP", "PPP",
            "PcPPcP", "ScSScS", "Pdiff", "Sdiff", "Pdiff10", "Sdiff2.5",
        ] {
            let phase = Phase::parse(name).unwrap();
            assert_eq!(phase.to_string(), name, "display of '{}'", name);
            assert_eq!(Phase::parse(&phase.to_string()).unwrap(), phase);
        }
    }

    #[test]
    fn display_canonical_forms() {
        assert_eq!(Phase::parse("P10").unwrap().to_string(), "Pdiff10");
        assert_eq!(Phase::parse("Pdiff0").unwrap().to_string(), "Pdiff");
        assert_eq!(Phase::parse("SVcSV").unwrap().to_string(), "SVcSV");
        assert_eq!(Phase::parse("SHcSH").unwrap().to_string(), "ScS");
        assert_eq!(Phase::parse("sVSV").unwrap().to_string(), "sVSV");
        assert_eq!(Phase::parse("SVdiff").unwrap().to_string(), "SVdiff");
        assert_eq!(
            Phase::parse_with("SS", Polarity::Psv).unwrap().to_string(),
            "SVSV"
        );
        assert_eq!("PKIKP".parse::<Phase>().unwrap(), Phase::pkikp());
    }
}

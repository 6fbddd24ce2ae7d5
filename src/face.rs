use crate::Error;

/// One of the six faces of the S2 sphere projection.
///
/// Web-mercator archives store all tiles on [`Face::Face0`]; the short
/// accessors on [`S2Tiles`](crate::S2Tiles) hard-wire that face.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Face {
    /// Face 0, which is also the web-mercator plane.
    #[default]
    Face0 = 0,
    /// Face 1
    Face1 = 1,
    /// Face 2
    Face2 = 2,
    /// Face 3
    Face3 = 3,
    /// Face 4
    Face4 = 4,
    /// Face 5
    Face5 = 5,
}

impl From<Face> for u8 {
    fn from(face: Face) -> Self {
        face as Self
    }
}

impl From<Face> for u64 {
    fn from(face: Face) -> Self {
        face as Self
    }
}

impl TryFrom<u8> for Face {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Face0),
            1 => Ok(Self::Face1),
            2 => Ok(Self::Face2),
            3 => Ok(Self::Face3),
            4 => Ok(Self::Face4),
            5 => Ok(Self::Face5),
            other => Err(Error::InvalidFace(other)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_try_from() {
        assert_eq!(Face::try_from(0).unwrap(), Face::Face0);
        assert_eq!(Face::try_from(5).unwrap(), Face::Face5);
        assert!(matches!(Face::try_from(6), Err(Error::InvalidFace(6))));
    }

    #[test]
    fn test_into_u64() {
        assert_eq!(u64::from(Face::Face0), 0);
        assert_eq!(u64::from(Face::Face3), 3);
        assert_eq!(u8::from(Face::Face5), 5);
    }
}

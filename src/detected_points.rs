use glam::Vec2;
use nalgebra as na;

/// Feature descriptor. Float descriptors are compared with L2, binary ones with Hamming.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Float(Vec<f32>),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorLayout {
    Float(usize),
    Binary(usize),
}

impl std::fmt::Display for DescriptorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorLayout::Float(n) => write!(f, "float[{}]", n),
            DescriptorLayout::Binary(n) => write!(f, "binary[{} bytes]", n),
        }
    }
}

impl Descriptor {
    pub fn layout(&self) -> DescriptorLayout {
        match self {
            Descriptor::Float(v) => DescriptorLayout::Float(v.len()),
            Descriptor::Binary(v) => DescriptorLayout::Binary(v.len()),
        }
    }

    /// Distance in descriptor space, `None` when the layouts differ.
    pub fn distance(&self, other: &Descriptor) -> Option<f32> {
        match (self, other) {
            (Descriptor::Float(a), Descriptor::Float(b)) if a.len() == b.len() => Some(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt(),
            ),
            (Descriptor::Binary(a), Descriptor::Binary(b)) if a.len() == b.len() => Some(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| (x ^ y).count_ones())
                    .sum::<u32>() as f32,
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    pub p2d: Vec2,
    pub descriptor: Descriptor,
}

impl Keypoint {
    pub fn new(p2d: Vec2, descriptor: Descriptor) -> Keypoint {
        Keypoint { p2d, descriptor }
    }

    pub fn na_p2d(&self) -> na::Vector2<f64> {
        na::Vector2::new(self.p2d.x as f64, self.p2d.y as f64)
    }
}

/// Keypoints of one frame, in detector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameFeatures {
    pub keypoints: Vec<Keypoint>,
}

impl FrameFeatures {
    pub fn new(keypoints: Vec<Keypoint>) -> FrameFeatures {
        FrameFeatures { keypoints }
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Layout shared by all descriptors of the frame. Mixed layouts report the first offender.
    pub fn layout(&self) -> Result<Option<DescriptorLayout>, (DescriptorLayout, DescriptorLayout)> {
        let mut layouts = self.keypoints.iter().map(|k| k.descriptor.layout());
        let Some(first) = layouts.next() else {
            return Ok(None);
        };
        match layouts.find(|l| *l != first) {
            Some(other) => Err((first, other)),
            None => Ok(Some(first)),
        }
    }
}

use crate::point_cloud::PointCloud;
use std::ops::{Deref, DerefMut};

pub type Face = [u32; 3];

/// A triangle mesh: a point cloud plus faces referencing point ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    point_cloud: PointCloud,
    faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn face(&self, face_id: usize) -> Face {
        self.faces[face_id]
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn into_point_cloud(self) -> PointCloud {
        self.point_cloud
    }
}

impl From<PointCloud> for Mesh {
    fn from(point_cloud: PointCloud) -> Self {
        Self {
            point_cloud,
            faces: Vec::new(),
        }
    }
}

impl Deref for Mesh {
    type Target = PointCloud;

    fn deref(&self) -> &Self::Target {
        &self.point_cloud
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.point_cloud
    }
}

use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointCloud {
    attributes: Vec<PointAttribute>,
    num_points: usize,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_num_points(&mut self, num_points: usize) {
        self.num_points = num_points;
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Adds an attribute and returns its id. The unique id defaults to the
    /// attribute id.
    pub fn add_attribute(&mut self, mut attribute: PointAttribute) -> usize {
        if self.num_points == 0 && attribute.size() > 0 {
            self.num_points = attribute.size();
        }
        let id = self.attributes.len();
        attribute.set_unique_id(id as u32);
        self.attributes.push(attribute);
        id
    }

    /// Adds an attribute decoded from a stream, keeping its unique id.
    pub(crate) fn push_decoded_attribute(&mut self, attribute: PointAttribute) -> usize {
        self.attributes.push(attribute);
        self.attributes.len() - 1
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, att_id: usize) -> &PointAttribute {
        &self.attributes[att_id]
    }

    pub(crate) fn attribute_mut(&mut self, att_id: usize) -> &mut PointAttribute {
        &mut self.attributes[att_id]
    }

    pub fn attributes(&self) -> &[PointAttribute] {
        &self.attributes
    }

    pub fn named_attribute(&self, att_type: GeometryAttributeType) -> Option<&PointAttribute> {
        self.attributes
            .iter()
            .find(|att| att.attribute_type() == att_type)
    }

    pub fn attribute_by_unique_id(&self, unique_id: u32) -> Option<&PointAttribute> {
        self.attributes
            .iter()
            .find(|att| att.unique_id() == unique_id)
    }
}

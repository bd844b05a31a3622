extern crate nalgebra as na;
type Matrix3N = na::Matrix3xX<f64>;
type Vector3 = na::Vector3<f64>;

use thiserror::Error;

pub use crate::index::{Index, VertexIndex, LinkIndex, Range};
use crate::geometry::{GeometryError, ensure_finite};
use crate::quaternions::View;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Vertex {0} is not part of the model")]
    MissingVertex(VertexIndex),
    #[error("Cannot link vertex {0} to itself")]
    SelfLink(VertexIndex),
    #[error("Vertices {0} and {1} are already linked")]
    DuplicateLink(VertexIndex, VertexIndex)
}

/// Point of a polyhedral model
#[derive(Debug, Clone)]
pub struct Vertex {
    id: usize,
    pub location: Vector3,
    /// Orientation of whatever the vertex stands for
    pub view: View,
    pub selected: bool,
    /// Figure of merit
    pub fom: f64,
    /// Linked vertices in insertion order
    neighbors: Vec<VertexIndex>
}

impl Vertex {
    fn new(id: usize, location: Vector3) -> Vertex {
        Vertex {
            id,
            location,
            view: View::default(),
            selected: true,
            fom: 0.0,
            neighbors: Vec::new()
        }
    }

    /// Identifier, unique within a model and never reused
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn neighbors(&self) -> &[VertexIndex] {
        &self.neighbors
    }

    pub fn valence(&self) -> usize {
        self.neighbors.len()
    }
}

/// Undirected connection between two distinct vertices
#[derive(Debug, Clone)]
pub struct Link {
    vertices: [VertexIndex; 2],
    /// Reference length
    pub length: f64,
    /// Display radius
    pub radius: f64,
    pub selected: bool
}

impl Link {
    pub fn vertices(&self) -> [VertexIndex; 2] {
        self.vertices
    }

    pub fn contains(&self, v: VertexIndex) -> bool {
        self.vertices.contains(&v)
    }

    /// The endpoint that is not `v`, if `v` is an endpoint
    pub fn other(&self, v: VertexIndex) -> Option<VertexIndex> {
        match self.vertices {
            [a, b] if a == v => Some(b),
            [a, b] if b == v => Some(a),
            _ => None
        }
    }
}

/// Vertex and link arenas of a polyhedral model
///
/// Vertices and links are addressed by integer handles. Removing vertices
/// compacts the arenas, invalidating previously handed out handles.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Point group label, if known
    pub symmetry: String,
    /// Chirality: -1, 0 (achiral or unknown) or +1
    pub handedness: i8,
    /// Label of the matching reference polyhedron, if classified
    pub shape: Option<String>,
    vertices: Vec<Vertex>,
    links: Vec<Link>,
    /// Last identifier handed out
    last_id: usize
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    /// Create an unlinked model with one vertex per column
    pub fn from_locations(locations: &Matrix3N) -> Model {
        let mut model = Model::new();
        for col in locations.column_iter() {
            model.add_vertex(col.into_owned());
        }
        model
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_indices(&self) -> Range<VertexIndex> {
        VertexIndex::range(self.vertices.len())
    }

    pub fn link_indices(&self) -> Range<LinkIndex> {
        LinkIndex::range(self.links.len())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn vertex(&self, v: VertexIndex) -> &Vertex {
        &self.vertices[v.get()]
    }

    pub fn vertex_mut(&mut self, v: VertexIndex) -> &mut Vertex {
        &mut self.vertices[v.get()]
    }

    pub fn link(&self, l: LinkIndex) -> &Link {
        &self.links[l.get()]
    }

    pub fn link_mut(&mut self, l: LinkIndex) -> &mut Link {
        &mut self.links[l.get()]
    }

    pub fn location(&self, v: VertexIndex) -> Vector3 {
        self.vertices[v.get()].location
    }

    pub fn neighbors(&self, v: VertexIndex) -> &[VertexIndex] {
        self.vertices[v.get()].neighbors()
    }

    pub fn valence(&self, v: VertexIndex) -> usize {
        self.vertices[v.get()].valence()
    }

    /// Vertex locations as matrix columns, in arena order
    pub fn locations(&self) -> Matrix3N {
        Matrix3N::from_fn(self.vertices.len(), |i, j| self.vertices[j].location[i])
    }

    /// Fail if any vertex location is NaN or infinite
    pub fn ensure_finite(&self) -> Result<(), GeometryError> {
        ensure_finite(&self.locations(), "model vertex locations")
    }

    /// Largest identifier in use, zero for an empty model
    pub fn max_id(&self) -> usize {
        self.vertices.iter().map(|v| v.id).max().unwrap_or(0)
    }

    pub fn add_vertex(&mut self, location: Vector3) -> VertexIndex {
        self.last_id += 1;
        self.vertices.push(Vertex::new(self.last_id, location));
        VertexIndex::from(self.vertices.len() - 1)
    }

    pub fn link_between(&self, a: VertexIndex, b: VertexIndex) -> Option<LinkIndex> {
        self.links.iter()
            .position(|l| l.contains(a) && l.contains(b) && a != b)
            .map(LinkIndex::from)
    }

    pub fn are_linked(&self, a: VertexIndex, b: VertexIndex) -> bool {
        a.get() < self.vertices.len() && self.vertices[a.get()].neighbors.contains(&b)
    }

    /// Link two vertices, reference length set to their current distance
    pub fn add_link(&mut self, a: VertexIndex, b: VertexIndex) -> Result<LinkIndex, ModelError> {
        for v in [a, b] {
            if v.get() >= self.vertices.len() {
                return Err(ModelError::MissingVertex(v));
            }
        }
        if a == b {
            return Err(ModelError::SelfLink(a));
        }
        if self.are_linked(a, b) {
            return Err(ModelError::DuplicateLink(a, b));
        }

        let length = (self.location(a) - self.location(b)).norm();
        self.links.push(Link {vertices: [a, b], length, radius: 0.0, selected: true});
        self.vertices[a.get()].neighbors.push(b);
        self.vertices[b.get()].neighbors.push(a);
        Ok(LinkIndex::from(self.links.len() - 1))
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
        for vertex in self.vertices.iter_mut() {
            vertex.neighbors.clear();
        }
    }

    /// Replace the link arena, dropping self links and duplicates
    ///
    /// Returns the number of links dropped.
    fn rebuild_links(&mut self, links: Vec<Link>) -> usize {
        self.clear_links();
        let mut dropped = 0;
        for link in links {
            let [a, b] = link.vertices;
            if a == b || self.are_linked(a, b) {
                dropped += 1;
                continue;
            }
            self.vertices[a.get()].neighbors.push(b);
            self.vertices[b.get()].neighbors.push(a);
            self.links.push(link);
        }
        dropped
    }

    /// Compact the vertex arena, keeping vertices flagged in `keep`
    ///
    /// Links to removed vertices are deleted. Returns the remaining vertex count.
    pub fn retain_vertices(&mut self, keep: &[bool]) -> usize {
        assert_eq!(keep.len(), self.vertices.len());

        let mut mapping: Vec<Option<VertexIndex>> = vec![None; keep.len()];
        let mut next = 0;
        for (old, &kept) in keep.iter().enumerate() {
            if kept {
                mapping[old] = Some(VertexIndex::from(next));
                next += 1;
            }
        }

        let vertices = std::mem::take(&mut self.vertices);
        self.vertices = vertices.into_iter()
            .zip(keep.iter())
            .filter_map(|(v, &kept)| kept.then_some(v))
            .collect();

        let links = std::mem::take(&mut self.links).into_iter()
            .filter_map(|mut link| {
                let [a, b] = link.vertices;
                let (a, b) = (mapping[a.get()]?, mapping[b.get()]?);
                link.vertices = [a, b];
                Some(link)
            })
            .collect();
        self.rebuild_links(links);

        self.vertices.len()
    }

    /// Merge vertices into representatives
    ///
    /// `representative[v]` names the vertex that `v` is merged into, which must
    /// represent itself. Links are redirected to the representatives, links
    /// collapsing to a single vertex or duplicating another are dropped.
    pub fn merge_into(&mut self, representative: &[VertexIndex]) -> usize {
        assert_eq!(representative.len(), self.vertices.len());

        let links = std::mem::take(&mut self.links).into_iter()
            .map(|mut link| {
                link.vertices = link.vertices.map(|v| representative[v.get()]);
                link
            })
            .collect();
        let dropped = self.rebuild_links(links);
        if dropped > 0 {
            log::debug!("Dropped {} links collapsed by merging vertices", dropped);
        }

        let keep: Vec<bool> = representative.iter()
            .enumerate()
            .map(|(i, r)| r.get() == i)
            .collect();
        self.retain_vertices(&keep)
    }

    /// Average vertices closer than `distance` into single vertices
    ///
    /// Vertices are visited in arena order. Each unmerged vertex absorbs all
    /// later unmerged vertices within `distance` of its original location, and
    /// moves to their mean location. Figures of merit are averaged alike.
    /// Returns the remaining vertex count.
    pub fn consolidate(&mut self, distance: f64) -> usize {
        let n = self.vertices.len();
        let positions = self.locations();
        let mut representative: Vec<Option<VertexIndex>> = vec![None; n];

        for i in 0..n {
            if representative[i].is_some() {
                continue;
            }
            representative[i] = Some(VertexIndex::from(i));

            let mut location_sum = self.vertices[i].location;
            let mut fom_sum = self.vertices[i].fom;
            let mut count = 1;
            for j in (i + 1)..n {
                if representative[j].is_none() && (positions.column(i) - positions.column(j)).norm() < distance {
                    representative[j] = Some(VertexIndex::from(i));
                    location_sum += self.vertices[j].location;
                    fom_sum += self.vertices[j].fom;
                    count += 1;
                }
            }

            if count > 1 {
                self.vertices[i].location = location_sum / count as f64;
                self.vertices[i].fom = fom_sum / count as f64;
            }
        }

        let representative: Vec<VertexIndex> = representative.into_iter()
            .enumerate()
            .map(|(i, r)| r.unwrap_or(VertexIndex::from(i)))
            .collect();
        let remaining = self.merge_into(&representative);
        log::debug!("Consolidated {} vertices into {} at distance {}", n, remaining, distance);
        remaining
    }
}

pub mod links;
pub mod transform;
pub mod solids;

use petgraph::unionfind::UnionFind;

use crate::model::{Model, VertexIndex, Index};
use crate::inertia::center_of_mass;

impl Model {
    /// Link all vertex pairs closer than `max_distance` that are not yet linked
    ///
    /// Returns the number of links added.
    pub fn link_by_distance(&mut self, max_distance: f64) -> usize {
        let n = self.vertex_count();
        let mut added = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (VertexIndex::from(i), VertexIndex::from(j));
                if self.are_linked(a, b) || (self.location(a) - self.location(b)).norm() >= max_distance {
                    continue;
                }
                if let Ok(link) = self.add_link(a, b) {
                    self.link_mut(link).radius = 0.1 * max_distance;
                    added += 1;
                }
            }
        }
        log::debug!("Added {} links shorter than {}", added, max_distance);
        added
    }

    /// Link vertex pairs forming edges of the convex hull of a centered shell
    ///
    /// For each pair, the midpoint relative to the centroid is tested against
    /// all other vertices. A pair is an edge unless some other vertex lies at
    /// or beyond the plane through the midpoint perpendicular to it. This
    /// excludes diametric pairs as well as face diagonals. Vertices are
    /// expected to lie roughly on a sphere about their centroid.
    ///
    /// Returns the number of links added.
    pub fn link_hull(&mut self) -> usize {
        let n = self.vertex_count();
        if n < 2 {
            return 0;
        }

        let mut relative = self.locations();
        let center = center_of_mass(&relative);
        for mut col in relative.column_iter_mut() {
            col -= center;
        }
        let scale = relative.column_iter()
            .map(|c| c.norm_squared())
            .fold(0.0, f64::max);
        let tolerance = 1e-6 * scale;

        let mut added = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let midpoint = 0.5 * (relative.column(i) + relative.column(j));
                let threshold = midpoint.norm_squared() - tolerance;
                let occluded = (0..n)
                    .filter(|&k| k != i && k != j)
                    .any(|k| relative.column(k).dot(&midpoint) >= threshold);
                if occluded {
                    continue;
                }

                let (a, b) = (VertexIndex::from(i), VertexIndex::from(j));
                if self.add_link(a, b).is_ok() {
                    added += 1;
                }
            }
        }
        log::debug!("Added {} hull links among {} vertices", added, n);
        added
    }

    /// Partition the vertices into linked components
    ///
    /// Components are ordered by their first vertex, members ascending.
    pub fn connected_clusters(&self) -> Vec<Vec<VertexIndex>> {
        let n = self.vertex_count();
        let mut union_find = UnionFind::<usize>::new(n);
        for link in self.links() {
            let [a, b] = link.vertices();
            union_find.union(a.get(), b.get());
        }

        let mut clusters: Vec<Vec<VertexIndex>> = Vec::new();
        let mut cluster_of_root: Vec<Option<usize>> = vec![None; n];
        for v in self.vertex_indices() {
            let root = union_find.find(v.get());
            match cluster_of_root[root] {
                Some(c) => clusters[c].push(v),
                None => {
                    cluster_of_root[root] = Some(clusters.len());
                    clusters.push(vec![v]);
                }
            }
        }
        clusters
    }
}

use serde::Serialize;

pub type LineId = u64;

/// Handle to a cluster owned by a `ClusterStore`. Stable for the store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClusterId(pub(crate) usize);

impl ClusterId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    template: Vec<String>,
    member_ids: Vec<LineId>,
}

impl Cluster {
    pub fn new(template: Vec<String>, first_member: LineId) -> Self {
        Self { template, member_ids: vec![first_member] }
    }

    pub(crate) fn from_parts(template: Vec<String>, member_ids: Vec<LineId>) -> Self {
        Self { template, member_ids }
    }

    pub fn template(&self) -> &[String] {
        &self.template
    }

    pub fn template_string(&self) -> String {
        crate::token::join(&self.template)
    }

    pub fn member_ids(&self) -> &[LineId] {
        &self.member_ids
    }

    pub fn size(&self) -> usize {
        self.member_ids.len()
    }

    /// Records a new member and swaps in the generalized template if it changed.
    /// Returns whether the template was replaced.
    pub(crate) fn absorb(&mut self, line_id: LineId, merged: Vec<String>) -> bool {
        debug_assert_eq!(merged.len(), self.template.len());
        self.member_ids.push(line_id);
        if merged != self.template {
            self.template = merged;
            true
        } else {
            false
        }
    }
}

/// Single owner of every cluster. Tree leaves only hold `ClusterId`s into it.
#[derive(Debug, Clone, Default)]
pub struct ClusterStore {
    clusters: Vec<Cluster>,
}

impl ClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_clusters(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn push(&mut self, cluster: Cluster) -> ClusterId {
        self.clusters.push(cluster);
        ClusterId(self.clusters.len() - 1)
    }

    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.clusters.get_mut(id.0)
    }

    pub fn as_slice(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &Cluster)> {
        self.clusters.iter().enumerate().map(|(i, c)| (ClusterId(i), c))
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

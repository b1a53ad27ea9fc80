//! UV shell detection.
//!
//! A shell is a connected piece of the UV layout: UVs are connected when a
//! triangle uses them together. Seams separate shells because the two sides
//! of a seam reference different UV ids.

use crate::mesh::{FaceId, TexturedMesh, UvId};

/// Shell assignment for every UV of a mesh.
#[derive(Debug, Clone)]
pub struct UvShells {
    /// Shell index per UV; `None` for UVs no face references.
    shell_of: Vec<Option<usize>>,
    /// UV ids per shell.
    members: Vec<Vec<UvId>>,
    /// Face ids per shell.
    faces: Vec<Vec<FaceId>>,
}

impl UvShells {
    /// Number of shells.
    #[inline]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Shell a UV belongs to.
    #[inline]
    pub fn shell_of(&self, uv: UvId) -> Option<usize> {
        self.shell_of.get(uv.index()).copied().flatten()
    }

    /// UVs in a shell.
    pub fn members(&self, shell: usize) -> &[UvId] {
        &self.members[shell]
    }

    /// Faces in a shell.
    pub fn faces(&self, shell: usize) -> &[FaceId] {
        &self.faces[shell]
    }
}

/// Disjoint-set forest over UV indices.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Find the UV shells of a mesh.
///
/// Shells are numbered in order of their first face.
pub fn find_uv_shells(mesh: &TexturedMesh) -> UvShells {
    let n = mesh.num_uvs();
    let mut uf = UnionFind::new(n);
    let mut used = vec![false; n];

    for (_, face) in mesh.faces() {
        let [a, b, c] = face.uvs.map(UvId::index);
        uf.union(a, b);
        uf.union(b, c);
        used[a] = true;
        used[b] = true;
        used[c] = true;
    }

    let mut root_to_shell: Vec<Option<usize>> = vec![None; n];
    let mut shell_of: Vec<Option<usize>> = vec![None; n];
    let mut members: Vec<Vec<UvId>> = Vec::new();
    let mut faces: Vec<Vec<FaceId>> = Vec::new();

    for (fid, face) in mesh.faces() {
        let root = uf.find(face.uvs[0].index());
        let shell = *root_to_shell[root].get_or_insert_with(|| {
            members.push(Vec::new());
            faces.push(Vec::new());
            members.len() - 1
        });
        faces[shell].push(fid);
    }

    for uv in 0..n {
        if !used[uv] {
            continue;
        }
        let root = uf.find(uv);
        if let Some(shell) = root_to_shell[root] {
            shell_of[uv] = Some(shell);
            members[shell].push(UvId::new(uv));
        }
    }

    UvShells {
        shell_of,
        members,
        faces,
    }
}

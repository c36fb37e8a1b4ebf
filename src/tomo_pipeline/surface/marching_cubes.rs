//! Marching cubes over a regular scalar grid.
//!
//! Triangle table from the public-domain `MarchingCubeCpp` library. Edge
//! vertices are shared between neighbouring cells through a two-layer slab so
//! each crossing is emitted exactly once.

#![allow(clippy::unreadable_literal)]

use glam::Vec3;
use ndarray::ArrayView3;

use super::types::Mesh;

/// Corner offsets; bit `k` of a cell configuration is corner `k`.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// `(axis, origin offset, corner a, corner b)` for each of the 12 cube edges.
const EDGES: [(usize, [usize; 3], usize, usize); 12] = [
    (0, [0, 0, 0], 0, 1),
    (0, [0, 1, 0], 2, 3),
    (0, [0, 0, 1], 4, 5),
    (0, [0, 1, 1], 6, 7),
    (1, [0, 0, 0], 0, 2),
    (1, [1, 0, 0], 1, 3),
    (1, [0, 0, 1], 4, 6),
    (1, [1, 0, 1], 5, 7),
    (2, [0, 0, 0], 0, 4),
    (2, [1, 0, 0], 1, 5),
    (2, [0, 1, 0], 2, 6),
    (2, [1, 1, 0], 3, 7),
];

/// Vertex ids for the three edges leaving each node of two z-layers.
struct EdgeSlab {
    nx: usize,
    ny: usize,
    ids: Vec<[u32; 3]>,
}

impl EdgeSlab {
    fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            ids: vec![[0; 3]; nx * ny * 2],
        }
    }

    fn slot(&self, [x, y, z]: [usize; 3]) -> usize {
        self.nx * self.ny * (z % 2) + y * self.nx + x
    }

    fn get(&self, node: [usize; 3], axis: usize) -> u32 {
        self.ids[self.slot(node)][axis]
    }

    fn set(&mut self, node: [usize; 3], axis: usize, id: u32) {
        let slot = self.slot(node);
        self.ids[slot][axis] = id;
    }
}

/// Extracts the surface `field == iso`, with values above `iso` on the inside.
///
/// Vertices are in grid-index space. Returns an empty mesh when any dimension
/// is smaller than two.
pub fn marching_cubes(field: ArrayView3<'_, f32>, iso: f32) -> Mesh {
    let (nx, ny, nz) = field.dim();
    let mut mesh = Mesh::default();
    if nx < 2 || ny < 2 || nz < 2 {
        return mesh;
    }

    // negative inside, so a set configuration bit marks a solid corner
    let signed = |[x, y, z]: [usize; 3]| iso - field[[x, y, z]];
    let mut slab = EdgeSlab::new(nx, ny);

    for z in 0..nz - 1 {
        for y in 0..ny - 1 {
            for x in 0..nx - 1 {
                let cell = [x, y, z];
                let corner = |k: usize| {
                    let [dx, dy, dz] = CORNERS[k];
                    [x + dx, y + dy, z + dz]
                };
                let values: [f32; 8] = std::array::from_fn(|k| signed(corner(k)));

                let config = values
                    .iter()
                    .enumerate()
                    .fold(0usize, |acc, (k, v)| if *v < 0.0 { acc | (1 << k) } else { acc });
                if config == 0 || config == 255 {
                    continue;
                }

                let mut edge_ids = [0u32; 12];
                for (edge, &(axis, offset, a, b)) in EDGES.iter().enumerate() {
                    let node = [x + offset[0], y + offset[1], z + offset[2]];
                    // earlier cells already own edges on their shared faces
                    let owned = (0..3).all(|d| d == axis || offset[d] == 1 || cell[d] == 0);
                    if owned {
                        let (va, vb) = (values[a], values[b]);
                        if (va < 0.0) != (vb < 0.0) {
                            let mut position =
                                Vec3::new(node[0] as f32, node[1] as f32, node[2] as f32);
                            position[axis] += va / (va - vb);
                            slab.set(node, axis, mesh.vertices.len() as u32);
                            mesh.vertices.push(position);
                        }
                    }
                    edge_ids[edge] = slab.get(node, axis);
                }

                let mut entry = MC_TRIS[config];
                let triangles = (entry & 0xF) as usize;
                entry >>= 4;
                for _ in 0..triangles {
                    let a = edge_ids[(entry & 0xF) as usize];
                    entry >>= 4;
                    let b = edge_ids[(entry & 0xF) as usize];
                    entry >>= 4;
                    let c = edge_ids[(entry & 0xF) as usize];
                    entry >>= 4;
                    push_face(&mut mesh, [a, b, c]);
                }
            }
        }
    }

    mesh
}

fn push_face(mesh: &mut Mesh, face: [u32; 3]) {
    let [a, b, c] = face.map(|i| mesh.vertices[i as usize]);
    mesh.normals.push((b - a).cross(c - a).normalize_or_zero());
    mesh.faces.push(face);
}

/// Triangle table: low nibble is the triangle count, then one nibble per edge
/// index, three per triangle.
#[rustfmt::skip]
static MC_TRIS: [u64; 256] = [
    0, 33793, 36945, 159668546,
    18961, 144771090, 5851666, 595283255635,
    20913, 67640146, 193993474, 655980856339,
    88782242, 736732689667, 797430812739, 194554754,
    26657, 104867330, 136709522, 298069416227,
    109224258, 8877909667, 318136408323, 1567994331701604,
    189884450, 350847647843, 559958167731, 3256298596865604,
    447393122899, 651646838401572, 2538311371089956, 737032694307,
    29329, 43484162, 91358498, 374810899075,
    158485010, 178117478419, 88675058979, 433581536604804,
    158486962, 649105605635, 4866906995, 3220959471609924,
    649165714851, 3184943915608436, 570691368417972, 595804498035,
    124295042, 431498018963, 508238522371, 91518530,
    318240155763, 291789778348404, 1830001131721892, 375363605923,
    777781811075, 1136111028516116, 3097834205243396, 508001629971,
    2663607373704004, 680242583802939237, 333380770766129845, 179746658,
    42545, 138437538, 93365810, 713842853011,
    73602098, 69575510115, 23964357683, 868078761575828,
    28681778, 713778574611, 250912709379, 2323825233181284,
    302080811955, 3184439127991172, 1694042660682596, 796909779811,
    176306722, 150327278147, 619854856867, 1005252473234484,
    211025400963, 36712706, 360743481544788, 150627258963,
    117482600995, 1024968212107700, 2535169275963444, 4734473194086550421,
    628107696687956, 9399128243, 5198438490361643573, 194220594,
    104474994, 566996932387, 427920028243, 2014821863433780,
    492093858627, 147361150235284, 2005882975110676, 9671606099636618005,
    777701008947, 3185463219618820, 482784926917540, 2900953068249785909,
    1754182023747364, 4274848857537943333, 13198752741767688709, 2015093490989156,
    591272318771, 2659758091419812, 1531044293118596, 298306479155,
    408509245114388, 210504348563, 9248164405801223541, 91321106,
    2660352816454484, 680170263324308757, 8333659837799955077, 482966828984116,
    4274926723105633605, 3184439197724820, 192104450, 15217,
    45937, 129205250, 129208402, 529245952323,
    169097138, 770695537027, 382310500883, 2838550742137652,
    122763026, 277045793139, 81608128403, 1991870397907988,
    362778151475, 2059003085103236, 2132572377842852, 655681091891,
    58419234, 239280858627, 529092143139, 1568257451898804,
    447235128115, 679678845236084, 2167161349491220, 1554184567314086709,
    165479003923, 1428768988226596, 977710670185060, 10550024711307499077,
    1305410032576132, 11779770265620358997, 333446212255967269, 978168444447012,
    162736434, 35596216627, 138295313843, 891861543990356,
    692616541075, 3151866750863876, 100103641866564, 6572336607016932133,
    215036012883, 726936420696196, 52433666, 82160664963,
    2588613720361524, 5802089162353039525, 214799000387, 144876322,
    668013605731, 110616894681956, 1601657732871812, 430945547955,
    3156382366321172, 7644494644932993285, 3928124806469601813, 3155990846772900,
    339991010498708, 10743689387941597493, 5103845475, 105070898,
    3928064910068824213, 156265010, 1305138421793636, 27185,
    195459938, 567044449971, 382447549283, 2175279159592324,
    443529919251, 195059004769796, 2165424908404116, 1554158691063110021,
    504228368803, 1436350466655236, 27584723588724, 1900945754488837749,
    122971970, 443829749251, 302601798803, 108558722,
    724700725875, 43570095105972, 2295263717447940, 2860446751369014181,
    2165106202149444, 69275726195, 2860543885641537797, 2165106320445780,
    2280890014640004, 11820349930268368933, 8721082628082003989, 127050770,
    503707084675, 122834978, 2538193642857604, 10129,
    801441490467, 2923200302876740, 1443359556281892, 2901063790822564949,
    2728339631923524, 7103874718248233397, 12775311047932294245, 95520290,
    2623783208098404, 1900908618382410757, 137742672547, 2323440239468964,
    362478212387, 727199575803140, 73425410, 34337,
    163101314, 668566030659, 801204361987, 73030562,
    591509145619, 162574594, 100608342969108, 5553,
    724147968595, 1436604830452292, 176259090, 42001,
    143955266, 2385, 18433, 0,
];
